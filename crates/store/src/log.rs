//! Read-only queries over the inventory log.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use stockroom_core::{LogEntryId, ProductId};
use stockroom_inventory::{InventoryAction, LogEntry};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

/// Default page size for [`LogReader::list_recent`] callers.
pub const DEFAULT_RECENT_LIMIT: u32 = 25;

const SELECT_ENTRY: &str = r#"
    SELECT
        l.log_id,
        l.product_id,
        COALESCE(p.name, l.product_name) AS product_name,
        l.action,
        l.quantity,
        l.timestamp,
        l.notes
    FROM inventory_log l
    LEFT JOIN products p ON p.product_id = l.product_id
"#;

#[derive(Debug, Clone, Copy)]
pub struct LogReader<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LogReader<'a> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// The `limit` most recent entries, newest first.
    ///
    /// Entries of deleted products are included under their recorded name.
    #[instrument(skip(self), err)]
    pub async fn list_recent(&self, limit: u32) -> StoreResult<Vec<LogEntry>> {
        let rows = sqlx::query(&format!("{SELECT_ENTRY} ORDER BY l.log_id DESC LIMIT ?1"))
            .bind(i64::from(limit))
            .fetch_all(self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_recent_log", e))?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Full history of one product, newest first. Unknown ids yield an empty list.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn list_for_product(&self, product_id: ProductId) -> StoreResult<Vec<LogEntry>> {
        let rows = sqlx::query(&format!(
            "{SELECT_ENTRY} WHERE l.product_id = ?1 ORDER BY l.log_id DESC"
        ))
        .bind(product_id.get())
        .fetch_all(self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_product_log", e))?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Sum of all logged deltas for a product.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn balance_for_product(&self, product_id: ProductId) -> StoreResult<i64> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM inventory_log WHERE product_id = ?1",
        )
        .bind(product_id.get())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_log_balance", e))
    }
}

fn entry_from_row(row: &SqliteRow) -> StoreResult<LogEntry> {
    let decode = |e| map_sqlx_error("decode_log_entry", e);
    let action: String = row.try_get("action").map_err(decode)?;
    let action: InventoryAction = action.parse().map_err(|e| {
        StoreError::persistence("decode_log_entry", format!("stored action: {e}"))
    })?;

    Ok(LogEntry {
        id: LogEntryId::from_raw(row.try_get("log_id").map_err(decode)?),
        product_id: ProductId::from_raw(row.try_get("product_id").map_err(decode)?),
        product_name: row.try_get("product_name").map_err(decode)?,
        action,
        delta: row.try_get("quantity").map_err(decode)?,
        timestamp: row.try_get("timestamp").map_err(decode)?,
        note: row.try_get("notes").map_err(decode)?,
    })
}
