//! Error types for the security crate.

use thiserror::Error;
use zar_core::ServiceError;

/// Errors that can occur hashing passwords or handling tokens.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// bcrypt rejected the input or the stored hash.
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    /// Token encode/decode failure.
    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The configured signing algorithm name is unknown.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A stored password hash is not valid UTF-8 bcrypt output.
    #[error("stored password hash is corrupt")]
    CorruptStoredHash,

    /// The blocking-pool task was cancelled.
    #[error("hashing task cancelled")]
    TaskCancelled,
}

impl From<SecurityError> for ServiceError {
    fn from(err: SecurityError) -> Self {
        ServiceError::internal(format!("security error: {err}"))
    }
}
