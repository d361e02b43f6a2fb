//! Inventory ledger: the single path for quantity changes.
//!
//! Every accepted adjustment updates the product row and appends exactly one
//! log entry in the same transaction. A rejected adjustment writes nothing.
//!
//! ## Concurrency
//!
//! Adjustments take the write lock before reading the product, so concurrent
//! writers queue on the busy timeout and each one sees the quantity left by
//! the previous. The `UPDATE` still compares against the quantity it read;
//! a mismatch, or a writer that outlasts the busy timeout, fails with
//! [`StoreError::Conflict`] and writes nothing.

use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::instrument;

use stockroom_core::{DomainError, LogEntryId, ProductId};
use stockroom_inventory::{Discrepancy, InventoryAction, NewLogEntry, StockLevel};

use crate::begin_write;
use crate::error::{StoreError, StoreResult, map_sqlx_error};
use crate::product::load_product;

#[derive(Debug, Clone, Copy)]
pub struct Ledger<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Ledger<'a> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply `delta` to a product's quantity and record it.
    ///
    /// Any action of the vocabulary is accepted with either sign of delta.
    /// Returns the new quantity.
    #[instrument(
        skip(self, note),
        fields(product_id = %product_id, action = %action),
        err
    )]
    pub async fn adjust_quantity(
        &self,
        product_id: ProductId,
        delta: i64,
        action: InventoryAction,
        note: Option<String>,
    ) -> StoreResult<i64> {
        let mut tx = begin_write(self.pool).await?;

        let product = load_product(&mut *tx, product_id)
            .await?
            .ok_or_else(|| DomainError::product_not_found(product_id))?;

        let current = StockLevel::new(product.quantity)?;
        let next = match current.apply(product_id, delta) {
            Ok(next) => next,
            Err(err) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                tracing::warn!(
                    product_id = %product_id,
                    current = current.get(),
                    delta,
                    "stock adjustment rejected"
                );
                return Err(err.into());
            }
        };

        let now = Utc::now();
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET quantity = ?1, updated_at = ?2
            WHERE product_id = ?3 AND quantity = ?4
            "#,
        )
        .bind(next.get())
        .bind(now)
        .bind(product_id.get())
        .bind(current.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_quantity", e))?
        .rows_affected();

        if updated != 1 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::conflict(
                "update_quantity",
                format!("product {product_id} changed while adjusting stock"),
            ));
        }

        let entry = NewLogEntry::new(product_id, product.name, action, delta, note);
        let log_id = append_entry(&mut tx, &entry, now).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(
            product_id = %product_id,
            log_id = %log_id,
            delta,
            quantity = next.get(),
            "stock adjusted"
        );
        Ok(next.get())
    }

    /// Add `amount` units (`RESTOCK`).
    pub async fn restock(
        &self,
        product_id: ProductId,
        amount: i64,
        note: Option<String>,
    ) -> StoreResult<i64> {
        ensure_positive_amount(amount)?;
        self.adjust_quantity(product_id, amount, InventoryAction::Restock, note)
            .await
    }

    /// Remove `amount` units (`SALE`).
    pub async fn sell(
        &self,
        product_id: ProductId,
        amount: i64,
        note: Option<String>,
    ) -> StoreResult<i64> {
        ensure_positive_amount(amount)?;
        self.adjust_quantity(product_id, -amount, InventoryAction::Sale, note)
            .await
    }

    /// Products whose quantity differs from the sum of their log deltas.
    ///
    /// Empty when the ledger is consistent.
    #[instrument(skip(self), err)]
    pub async fn reconcile(&self) -> StoreResult<Vec<Discrepancy>> {
        let rows = sqlx::query(
            r#"
            SELECT
                p.product_id,
                p.name,
                p.quantity,
                COALESCE(SUM(l.quantity), 0) AS logged
            FROM products p
            LEFT JOIN inventory_log l ON l.product_id = p.product_id
            GROUP BY p.product_id, p.name, p.quantity
            ORDER BY p.product_id
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| map_sqlx_error("reconcile", e))?;

        let mut discrepancies = Vec::new();
        for row in rows {
            let decode = |e| map_sqlx_error("decode_reconcile", e);
            let product_id = ProductId::from_raw(row.try_get("product_id").map_err(decode)?);
            let name: String = row.try_get("name").map_err(decode)?;
            let quantity: i64 = row.try_get("quantity").map_err(decode)?;
            let logged: i64 = row.try_get("logged").map_err(decode)?;

            if let Some(found) = Discrepancy::check(product_id, &name, quantity, [logged]) {
                tracing::warn!(
                    product_id = %product_id,
                    quantity,
                    logged,
                    "ledger discrepancy"
                );
                discrepancies.push(found);
            }
        }
        Ok(discrepancies)
    }
}

fn ensure_positive_amount(amount: i64) -> StoreResult<()> {
    if amount <= 0 {
        return Err(DomainError::validation(format!("amount must be positive, got {amount}")).into());
    }
    Ok(())
}

/// Append one log entry inside the caller's transaction.
///
/// Crate-private so that only ledger-aware code paths (adjustments, product
/// creation and deletion, seeding) can write quantity-changing entries.
pub(crate) async fn append_entry(
    tx: &mut Transaction<'_, Sqlite>,
    entry: &NewLogEntry,
    at: DateTime<Utc>,
) -> StoreResult<LogEntryId> {
    let result = sqlx::query(
        r#"
        INSERT INTO inventory_log (
            product_id,
            product_name,
            action,
            quantity,
            timestamp,
            notes
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(entry.product_id.get())
    .bind(&entry.product_name)
    .bind(entry.action.as_str())
    .bind(entry.delta)
    .bind(at)
    .bind(&entry.note)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("append_log_entry", e))?;

    Ok(LogEntryId::from_raw(result.last_insert_rowid()))
}
