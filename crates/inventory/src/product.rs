use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Price, ProductId};

use crate::{optional_text, required_text};

/// Display marker for products without a (live) category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub quantity: i64,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Case-insensitive substring match against name or description.
    ///
    /// The keyword is matched as given, surrounding spaces included; a blank
    /// keyword matches nothing.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        if keyword.trim().is_empty() {
            return false;
        }
        let needle = keyword.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// Product joined with its category's display name at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// `None` when the product has no category or the reference dangles.
    pub category_name: Option<String>,
}

impl ProductView {
    pub fn category_label(&self) -> &str {
        self.category_name.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub quantity: i64,
    pub category_id: Option<CategoryId>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Price, quantity: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            quantity,
            category_id: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Trim fields and re-assert the non-negative stock invariant.
    pub fn normalized(self) -> DomainResult<Self> {
        if self.quantity < 0 {
            return Err(DomainError::validation(format!(
                "quantity cannot be negative: {}",
                self.quantity
            )));
        }
        Ok(Self {
            name: required_text("product name", &self.name)?,
            description: optional_text(self.description),
            price: self.price,
            quantity: self.quantity,
            category_id: self.category_id,
        })
    }
}

/// Partial update of a product's attributes: `None` keeps the current value.
///
/// Quantity is deliberately absent; only the ledger moves stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category_id: Option<CategoryId>,
}

impl ProductPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Merge the patch onto the current record, stamping `updated_at`.
    pub fn apply_to(&self, current: &Product, now: DateTime<Utc>) -> DomainResult<Product> {
        let name = match &self.name {
            Some(name) => required_text("product name", name)?,
            None => current.name.clone(),
        };
        let description = match &self.description {
            Some(description) => optional_text(Some(description.clone())),
            None => current.description.clone(),
        };
        Ok(Product {
            id: current.id,
            name,
            description,
            price: self.price.unwrap_or(current.price),
            quantity: current.quantity,
            category_id: self.category_id.or(current.category_id),
            created_at: current.created_at,
            updated_at: now,
        })
    }
}
