//! Store error model.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped by [`map_sqlx_error`] as follows:
//!
//! | SQLx Error | SQLite result code | StoreError | Scenario |
//! |------------|--------------------|------------|----------|
//! | Database (busy) | `5`, `517` | `Conflict` | Another writer holds or invalidated the snapshot |
//! | Database (other) | any other | `Persistence` | Constraint or I/O failure not classified by the caller |
//! | PoolClosed | N/A | `Persistence` | Store was closed |
//! | Other | N/A | `Persistence` | Driver / filesystem failures |
//!
//! Unique and foreign-key violations are classified by the repositories
//! themselves (`DuplicateName`, `HasDependents`) before falling back here.

use stockroom_core::DomainError;
use thiserror::Error;

/// Result type used by the store.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Deterministic domain failure (not found, negative stock, ...).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The row changed underneath the transaction; nothing was written.
    #[error("concurrent modification in {operation}: {message}")]
    Conflict {
        operation: &'static str,
        message: String,
    },

    /// Underlying storage failure.
    #[error("persistence failure in {operation}: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn persistence(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Persistence {
            operation,
            message: message.into(),
        }
    }

    pub fn conflict(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            operation,
            message: message.into(),
        }
    }

    /// The domain error, if this is one.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.domain().is_some_and(DomainError::is_not_found)
    }
}

/// Map SQLx errors to StoreError.
pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error: {}", db_err.message());
            match db_err.code().as_deref() {
                // SQLITE_BUSY, SQLITE_BUSY_SNAPSHOT
                Some("5") | Some("517") => StoreError::conflict(operation, msg),
                _ => StoreError::persistence(operation, msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::persistence(operation, "connection pool closed"),
        sqlx::Error::RowNotFound => {
            // We use fetch_optional everywhere a row may be missing.
            StoreError::persistence(operation, "unexpected row not found")
        }
        other => StoreError::persistence(operation, format!("sqlx error: {other}")),
    }
}

/// Check if an error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Check if an error is a foreign key violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
