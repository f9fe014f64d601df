//! Error types for the cache crate.

use thiserror::Error;
use zar_core::ServiceError;

/// Errors that can occur talking to the key/value store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The pool could not be built from configuration.
    #[error("failed to create cache pool: {0}")]
    CreatePool(#[from] deadpool_redis::CreatePoolError),

    /// The pool could not hand out a connection.
    #[error("failed to acquire cache connection: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// A command failed on the server.
    #[error("cache command failed: {0}")]
    Command(#[from] redis::RedisError),

    /// A stored entry could not be decoded.
    #[error("corrupt cache entry: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        ServiceError::internal(format!("cache error: {err}"))
    }
}
