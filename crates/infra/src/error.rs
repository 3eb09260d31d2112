//! Storage error model.
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx error | StoreError | Scenario |
//! |------------|------------|----------|
//! | Database (unique violation) | `Conflict` | two writers raced for the same invoice number |
//! | Database (foreign key violation) | `Conflict` | a client is still referenced by invoices |
//! | Database (`SQLITE_BUSY`) | `Conflict` | the write lock stayed taken past the busy timeout |
//! | Database (other) | `Database` | everything else, message passed through |
//! | PoolClosed / Io / other | `Database` | connection failures |

use thiserror::Error;

use invoicer_core::DomainError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("failed to decode stored row: {0}")]
    Decode(String),

    /// A domain rule rejected the operation while it ran against stored state.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Build a `map_err` closure that tags a SQLx error with the failing operation.
pub(crate) fn sqlx_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| map_sqlx_error(operation, err)
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                return StoreError::Conflict(format!("{operation}: {message}"));
            }
            match db_err.code().as_deref() {
                // SQLITE_BUSY and SQLITE_BUSY_SNAPSHOT
                Some("5") | Some("517") => StoreError::Conflict(format!("{operation}: {message}")),
                _ => StoreError::Database { operation, message },
            }
        }
        sqlx::Error::PoolClosed => StoreError::Database {
            operation,
            message: "connection pool closed".to_string(),
        },
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Decode(format!("{operation}: column {index}: {source}"))
        }
        other => StoreError::Database {
            operation,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_is_a_database_error() {
        match map_sqlx_error("list_clients", sqlx::Error::PoolClosed) {
            StoreError::Database { operation, message } => {
                assert_eq!(operation, "list_clients");
                assert_eq!(message, "connection pool closed");
            }
            other => panic!("expected Database error, got {other:?}"),
        }
    }

    #[test]
    fn domain_errors_display_transparently() {
        let err = StoreError::from(DomainError::validation("client 9 does not exist"));
        assert_eq!(err.to_string(), "validation failed: client 9 does not exist");
    }
}
