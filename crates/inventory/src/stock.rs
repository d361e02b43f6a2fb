//! Stock arithmetic and ledger reconciliation rules.

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ProductId};

/// A product's on-hand quantity. Never negative.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockLevel(i64);

impl StockLevel {
    pub fn new(quantity: i64) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation(format!(
                "quantity cannot be negative: {quantity}"
            )));
        }
        Ok(Self(quantity))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Decide the stock level after applying `delta`.
    ///
    /// Rejects the move (leaving `self` untouched) if it would go below zero
    /// or overflow.
    pub fn apply(self, product_id: ProductId, delta: i64) -> DomainResult<StockLevel> {
        let next = self.0.checked_add(delta).ok_or_else(|| {
            DomainError::validation(format!(
                "quantity overflow for product {product_id}: {} {delta:+}",
                self.0
            ))
        })?;
        if next < 0 {
            return Err(DomainError::NegativeStock {
                product_id,
                current: self.0,
                delta,
            });
        }
        Ok(StockLevel(next))
    }
}

/// A product whose recorded quantity disagrees with its log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub logged: i64,
}

impl Discrepancy {
    /// Compare a quantity against the log deltas recorded for it.
    pub fn check<I>(product_id: ProductId, product_name: &str, quantity: i64, deltas: I) -> Option<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let logged: i64 = deltas.into_iter().sum();
        (logged != quantity).then(|| Discrepancy {
            product_id,
            product_name: product_name.to_string(),
            quantity,
            logged,
        })
    }
}
