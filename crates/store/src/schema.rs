//! SQLite schema and first-run initialization.

use sqlx::{Sqlite, Transaction};
use tracing::instrument;

use crate::error::{StoreResult, map_sqlx_error};
use crate::seed;

/// DDL statements, applied in order. All are idempotent.
///
/// `inventory_log.product_id` carries no foreign key: log entries outlive the
/// products they describe, and `product_name` keeps the name they had.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        category_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL UNIQUE,
        description TEXT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        product_id  INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        description TEXT NULL,
        price       TEXT NOT NULL,
        quantity    INTEGER NOT NULL CHECK (quantity >= 0),
        category_id INTEGER NULL REFERENCES categories (category_id) ON DELETE RESTRICT,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_products_category
        ON products (category_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory_log (
        log_id       INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id   INTEGER NOT NULL,
        product_name TEXT NOT NULL,
        action       TEXT NOT NULL
                     CHECK (action IN ('CREATE', 'RESTOCK', 'SALE', 'DELETE', 'INITIAL')),
        quantity     INTEGER NOT NULL,
        timestamp    TEXT NOT NULL,
        notes        TEXT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_inventory_log_product
        ON inventory_log (product_id, log_id)
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS inventory_log_no_update
    BEFORE UPDATE ON inventory_log
    BEGIN
        SELECT RAISE(ABORT, 'inventory_log is append-only');
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS inventory_log_no_delete
    BEFORE DELETE ON inventory_log
    BEGIN
        SELECT RAISE(ABORT, 'inventory_log is append-only');
    END
    "#,
];

/// Ensure all tables exist and, for a newly created store, seed sample data.
///
/// Runs inside the caller's transaction, so a failed seed commits nothing.
/// `Store::open` removes a database file it created when this fails.
#[instrument(skip(tx), err)]
pub(crate) async fn initialize(
    tx: &mut Transaction<'_, Sqlite>,
    seed_sample_data: bool,
) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("create_schema", e))?;
    }

    if seed_sample_data {
        seed::sample_data(tx).await?;
    }

    Ok(())
}
