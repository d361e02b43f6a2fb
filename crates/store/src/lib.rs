//! `stockroom-store`
//!
//! **Responsibility:** SQLite persistence for the inventory domain.
//!
//! This crate provides:
//! - Schema creation and first-run sample data
//! - Category and product repositories
//! - The inventory ledger (the only writer of quantity changes and their log)
//! - Read-only queries over the inventory log
//!
//! Every write that pairs a record mutation with a log append runs inside a
//! single SQLite transaction.

pub mod category;
pub mod config;
pub mod error;
pub mod ledger;
pub mod log;
pub mod product;
mod schema;
mod seed;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sqlx::{Sqlite, SqlitePool, Transaction};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::instrument;

pub use category::CategoryRepository;
pub use config::{ConfigError, StoreConfig, StoreLocation};
pub use error::{StoreError, StoreResult};
pub use ledger::Ledger;
pub use log::LogReader;
pub use product::ProductRepository;

use error::map_sqlx_error;

/// Handle to an open inventory store.
///
/// Cheap to clone; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    created: bool,
}

impl Store {
    /// Open (creating if necessary) the store described by `config`.
    ///
    /// Sample data is seeded only when the database did not exist before this
    /// call and `config.seed_sample_data` is set. An existing but empty
    /// database is never re-seeded.
    #[instrument(skip(config), fields(location = ?config.location), err)]
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        let (options, pool_options, created) = match &config.location {
            StoreLocation::File(path) => {
                let created = !path.exists();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        StoreError::persistence(
                            "create_store_dir",
                            format!("failed to create {}: {e}", parent.display()),
                        )
                    })?;
                }
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal);
                let pool_options =
                    SqlitePoolOptions::new().max_connections(config.max_connections.max(1));
                (options, pool_options, created)
            }
            StoreLocation::Memory => {
                let options = SqliteConnectOptions::from_str("sqlite::memory:")
                    .map_err(|e| map_sqlx_error("memory_options", e))?;
                // Every connection to `:memory:` is its own database, so keep
                // exactly one alive for the lifetime of the pool.
                let pool_options = SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None);
                (options, pool_options, true)
            }
        };

        let options = options
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout());

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        if let Err(err) = initialize(&pool, created && config.seed_sample_data).await {
            pool.close().await;
            // A file this call created must not survive a failed first run,
            // or the next open would treat it as existing and skip seeding.
            if let (true, StoreLocation::File(path)) = (created, &config.location) {
                discard_new_file(path);
            }
            return Err(err);
        }

        tracing::info!(created, "inventory store ready");
        Ok(Self { pool, created })
    }

    /// Open an empty in-memory store.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::in_memory()).await
    }

    /// Whether this call created the database (and therefore possibly seeded it).
    pub fn was_created(&self) -> bool {
        self.created
    }

    pub fn categories(&self) -> CategoryRepository<'_> {
        CategoryRepository::new(&self.pool)
    }

    pub fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(&self.pool)
    }

    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.pool)
    }

    pub fn log(&self) -> LogReader<'_> {
        LogReader::new(&self.pool)
    }

    /// Raw pool access for diagnostics and tests.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Begin a transaction that holds the write lock from its first statement.
///
/// Writers queue on the busy timeout instead of failing when a deferred read
/// lock cannot be upgraded.
pub(crate) async fn begin_write(pool: &SqlitePool) -> StoreResult<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| map_sqlx_error("begin_transaction", e))
}

async fn initialize(pool: &SqlitePool, seed_sample_data: bool) -> StoreResult<()> {
    let mut tx = begin_write(pool).await?;
    schema::initialize(&mut tx, seed_sample_data).await?;
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

/// Remove a database file and its WAL sidecars. Missing files are ignored.
fn discard_new_file(path: &Path) {
    let sidecar = |suffix: &str| {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };

    for file in [path.to_path_buf(), sidecar("-wal"), sidecar("-shm")] {
        match std::fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %file.display(), error = %e, "failed to remove store file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discarding_a_new_store_removes_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.db");
        for name in ["inventory.db", "inventory.db-wal", "inventory.db-shm"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        discard_new_file(&path);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        // Already gone is fine.
        discard_new_file(&path);
    }
}
