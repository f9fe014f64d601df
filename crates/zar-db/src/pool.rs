//! Pool bootstrap and shutdown.

use crate::error::DbError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use zar_core::config::DatabaseConfig;

/// Open the bounded pool and run the embedded idempotent migrations.
pub async fn connect_and_migrate(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(
        min = config.min_connections,
        max = config.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Close the pool, waiting briefly for in-flight queries.
pub async fn close_pool(pool: &PgPool) {
    pool.close().await;
}
