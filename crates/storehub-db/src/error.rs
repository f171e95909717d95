//! # Database Error Types
//!
//! Infrastructure errors (pool, migrations) and the single place where
//! sqlx errors are classified into the domain taxonomy.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error                                                           │
//! │       │                                                                 │
//! │       ├── FK violation ────────────► StoreError::InvalidForeignKey      │
//! │       │                                                                 │
//! │       └── anything else ───────────► StoreError::Storage { op, .. }     │
//! │                                       (Get/Create/Update/Delete/        │
//! │                                        Scan/Iterate)                    │
//! │                                                                         │
//! │  "No rows" is never an sqlx error here: repositories use               │
//! │  fetch_optional / rows_affected and report NotFound themselves.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use storehub_core::{StorageOp, StoreError};

/// Pool and migration errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed outside of a repository.
    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for pool and migration operations.
pub type DbResult<T> = Result<T, DbError>;

/// Returns true when the store rejected a write because of a dangling
/// reference.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
        _ => false,
    }
}

/// Classifies an sqlx error raised while performing `op` on `entity`.
///
/// ## Usage
/// ```rust,ignore
/// query.fetch_optional(&pool).await.map_err(classify(StorageOp::Get, SALE))?;
/// ```
pub fn classify(op: StorageOp, entity: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        if is_foreign_key_violation(&err) {
            StoreError::InvalidForeignKey {
                entity,
                source: Box::new(err),
            }
        } else {
            StoreError::storage(op, entity, err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use storehub_core::ErrorKind;

    #[test]
    fn test_generic_errors_keep_operation() {
        let err = classify(StorageOp::Iterate, "sale")(sqlx::Error::PoolTimedOut);
        assert!(err.is(ErrorKind::Iterate));
        assert!(err.to_string().starts_with("failed to iterate sale:"));
    }

    #[test]
    fn test_non_database_errors_are_not_foreign_keys() {
        assert!(!is_foreign_key_violation(&sqlx::Error::RowNotFound));
    }
}
