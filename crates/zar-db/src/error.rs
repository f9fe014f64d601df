//! Error types for the database crate.

use thiserror::Error;
use zar_core::ServiceError;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// The requested row does not exist.
    #[error("row not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A check constraint rejected the write.
    #[error("check constraint violated: {0}")]
    CheckViolation(String),

    /// Migration failure at startup.
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Anything else from the driver.
    #[error("database error: {0}")]
    Other(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db) => match db.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    DbError::UniqueViolation(db.message().to_string())
                }
                sqlx::error::ErrorKind::CheckViolation => {
                    DbError::CheckViolation(db.message().to_string())
                }
                _ => DbError::Other(err),
            },
            _ => DbError::Other(err),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ServiceError::not_found("Not found"),
            DbError::UniqueViolation(msg) => ServiceError::conflict("Conflict")
                .with_metadata(serde_json::json!({ "constraint": msg })),
            DbError::CheckViolation(msg) => ServiceError::invalid_input("Invalid input")
                .with_metadata(serde_json::json!({ "constraint": msg })),
            // Driver details reach the persisted log only, never the client.
            other => ServiceError::internal("Internal server error")
                .with_metadata(serde_json::json!({ "database_error": other.to_string() })),
        }
    }
}
