//! Canonical domains and their safety state.

use crate::DbResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// A canonical `scheme://host/` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Domain {
    pub id: i64,
    pub url: String,
    pub is_secure: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert the domain on first sighting; the no-op update makes the
/// conflicting row come back with its id either way.
pub async fn upsert_domain(pool: &PgPool, url: &str, url_hash: &[u8]) -> DbResult<Domain> {
    let domain = sqlx::query_as::<_, Domain>(
        r#"
        INSERT INTO domains (url, url_hash)
        VALUES ($1, $2)
        ON CONFLICT (url_hash) DO UPDATE SET url = domains.url
        RETURNING id, url, is_secure, created_at
        "#,
    )
    .bind(url)
    .bind(url_hash)
    .fetch_one(pool)
    .await?;
    Ok(domain)
}

/// Flip the domain insecure and delete its URLs in one transaction.
/// Returns the number of URLs removed.
pub async fn mark_insecure(pool: &PgPool, domain_id: i64) -> DbResult<u64> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE domains SET is_secure = FALSE WHERE id = $1")
        .bind(domain_id)
        .execute(&mut *tx)
        .await?;
    let deleted = sqlx::query("DELETE FROM urls WHERE domain_id = $1")
        .bind(domain_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;
    Ok(deleted)
}

/// Admin override of the safety flag; flipping to insecure cascades like
/// a threat-intel match.
pub async fn set_secure(pool: &PgPool, domain_id: i64, is_secure: bool) -> DbResult<u64> {
    if is_secure {
        sqlx::query("UPDATE domains SET is_secure = TRUE WHERE id = $1")
            .bind(domain_id)
            .execute(pool)
            .await?;
        Ok(0)
    } else {
        mark_insecure(pool, domain_id).await
    }
}

pub async fn list_domains(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> DbResult<(i64, Vec<Domain>)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domains")
        .fetch_one(pool)
        .await?;
    let domains = sqlx::query_as::<_, Domain>(
        r#"
        SELECT id, url, is_secure, created_at
        FROM domains
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok((total, domains))
}

pub async fn delete_domain(pool: &PgPool, domain_id: i64) -> DbResult<()> {
    sqlx::query("DELETE FROM domains WHERE id = $1")
        .bind(domain_id)
        .execute(pool)
        .await?;
    Ok(())
}
