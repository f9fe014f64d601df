//! Postgres access for the Zar URL shortener.
//!
//! One repository module per aggregate, all operating on a shared
//! [`sqlx::PgPool`]. Migrations are embedded and idempotent; the pool is
//! opened once at startup and closed on shutdown.

pub mod analytics;
pub mod blacklist;
pub mod domains;
pub mod error;
pub mod logs;
pub mod pool;
pub mod sessions;
pub mod tags;
pub mod urls;
pub mod users;

pub use error::DbError;
pub use pool::{close_pool, connect_and_migrate};

/// Result alias for repository operations.
pub type DbResult<T> = Result<T, DbError>;
