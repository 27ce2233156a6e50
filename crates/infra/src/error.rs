//! Storage error model shared by the SKU store and the margin ledger.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Concurrent insert of the same key |
//! | Database (foreign key violation) | `23503` | `Validation` | Margin entry for a SKU that does not exist |
//! | Database (check constraint violation) | `23514` | `Validation` | Invalid data |
//! | Database (other) | Any other | `Database` | Other database errors |
//! | PoolClosed / other | N/A | `Database` | Network errors, connection failures, etc. |

use thiserror::Error;

use skumargin_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        StoreError::Validation(value.to_string())
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") | Some("23514") => StoreError::Validation(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
