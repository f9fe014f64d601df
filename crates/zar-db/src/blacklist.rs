//! Long-term storage for URLs the threat intel has condemned.

use crate::DbResult;
use sqlx::PgPool;

pub async fn is_blacklisted(pool: &PgPool, url_hash: &[u8]) -> DbResult<bool> {
    let hit: Option<i64> = sqlx::query_scalar("SELECT id FROM url_blacklist WHERE url_hash = $1")
        .bind(url_hash)
        .fetch_optional(pool)
        .await?;
    Ok(hit.is_some())
}

pub async fn add_to_blacklist(pool: &PgPool, url: &str, url_hash: &[u8]) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO url_blacklist (url, url_hash)
        VALUES ($1, $2)
        ON CONFLICT (url_hash) DO NOTHING
        "#,
    )
    .bind(url)
    .bind(url_hash)
    .execute(pool)
    .await?;
    Ok(())
}
