//! Short URL rows and their ownership edges.

use crate::{DbError, DbResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A `urls` row. The password hash stays out of this type; redirect
/// evaluation uses [`RedirectRow`].
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UrlRow {
    pub id: i64,
    pub domain_id: i64,
    pub original_url: String,
    pub short_code: String,
    pub clicks: i64,
    pub title: Option<String>,
    pub descr: Option<String>,
    pub qrcode_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A url row joined with its ownership edge, when one exists.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OwnedUrlRow {
    pub id: i64,
    pub domain_id: i64,
    pub original_url: String,
    pub short_code: String,
    pub clicks: i64,
    pub title: Option<String>,
    pub descr: Option<String>,
    pub qrcode_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub is_favorite: Option<bool>,
}

/// What the redirect path needs, nothing more.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RedirectRow {
    pub id: i64,
    pub original_url: String,
    pub p_hash: Option<Vec<u8>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Fields for a new url insert. The short code comes from the caller's
/// retry loop.
#[derive(Debug, Clone)]
pub struct NewUrl<'a> {
    pub domain_id: i64,
    pub original_url: &'a str,
    pub original_url_hash: &'a [u8],
    pub short_code: &'a str,
    pub p_hash: Option<&'a [u8]>,
    pub title: Option<&'a str>,
    pub descr: Option<&'a str>,
    pub expires_at: Option<DateTime<Utc>>,
}

const URL_COLUMNS: &str = "id, domain_id, original_url, short_code, clicks, title, descr, \
     qrcode_url, expires_at, is_active, created_at";

/// Insert one url row. A short-code collision surfaces as
/// [`DbError::UniqueViolation`] for the caller to retry.
pub async fn insert_url(pool: &PgPool, new: &NewUrl<'_>) -> DbResult<UrlRow> {
    let url = sqlx::query_as::<_, UrlRow>(&format!(
        r#"
        INSERT INTO urls (
            domain_id, original_url, original_url_hash, short_code,
            p_hash, title, descr, expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {URL_COLUMNS}
        "#
    ))
    .bind(new.domain_id)
    .bind(new.original_url)
    .bind(new.original_url_hash)
    .bind(new.short_code)
    .bind(new.p_hash)
    .bind(new.title)
    .bind(new.descr)
    .bind(new.expires_at)
    .fetch_one(pool)
    .await?;
    Ok(url)
}

/// Look for an existing active row this request may reuse.
///
/// Reuse applies only to plain links: rows without password or expiry, in
/// the same ownership slot (the given user's edge, or no edge at all for
/// anonymous callers) and with the same title.
pub async fn find_reusable(
    pool: &PgPool,
    domain_id: i64,
    original_url_hash: &[u8],
    title: Option<&str>,
    user_id: Option<Uuid>,
) -> DbResult<Option<OwnedUrlRow>> {
    let row = match user_id {
        Some(user_id) => {
            sqlx::query_as::<_, OwnedUrlRow>(
                r#"
                SELECT urls.id, urls.domain_id, urls.original_url, urls.short_code,
                       urls.clicks, urls.title, urls.descr, urls.qrcode_url,
                       urls.expires_at, urls.is_active, urls.created_at,
                       uu.user_id, uu.is_favorite
                FROM urls
                JOIN user_urls uu ON uu.url_id = urls.id AND uu.user_id = $3
                WHERE urls.domain_id = $1
                  AND urls.original_url_hash = $2
                  AND urls.p_hash IS NULL
                  AND urls.expires_at IS NULL
                  AND urls.is_active
                  AND urls.title IS NOT DISTINCT FROM $4
                LIMIT 1
                "#,
            )
            .bind(domain_id)
            .bind(original_url_hash)
            .bind(user_id)
            .bind(title)
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, OwnedUrlRow>(
                r#"
                SELECT urls.id, urls.domain_id, urls.original_url, urls.short_code,
                       urls.clicks, urls.title, urls.descr, urls.qrcode_url,
                       urls.expires_at, urls.is_active, urls.created_at,
                       uu.user_id, uu.is_favorite
                FROM urls
                LEFT JOIN user_urls uu ON uu.url_id = urls.id
                WHERE urls.domain_id = $1
                  AND urls.original_url_hash = $2
                  AND uu.url_id IS NULL
                  AND urls.p_hash IS NULL
                  AND urls.expires_at IS NULL
                  AND urls.is_active
                  AND urls.title IS NOT DISTINCT FROM $3
                LIMIT 1
                "#,
            )
            .bind(domain_id)
            .bind(original_url_hash)
            .bind(title)
            .fetch_optional(pool)
            .await?
        }
    };
    Ok(row)
}

/// Attach an ownership edge. One owner per url; a second owner is a
/// constraint violation.
pub async fn attach_owner(
    pool: &PgPool,
    url_id: i64,
    user_id: Uuid,
    is_favorite: bool,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO user_urls (url_id, user_id, is_favorite)
        VALUES ($1, $2, $3)
        ON CONFLICT (url_id) DO NOTHING
        "#,
    )
    .bind(url_id)
    .bind(user_id)
    .bind(is_favorite)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_qrcode_url(pool: &PgPool, url_id: i64, qrcode_url: &str) -> DbResult<()> {
    sqlx::query("UPDATE urls SET qrcode_url = $2 WHERE id = $1")
        .bind(url_id)
        .bind(qrcode_url)
        .execute(pool)
        .await?;
    Ok(())
}

/// Load what the redirect path needs. Inactive and unknown codes both
/// come back as `None`.
pub async fn get_redirect(pool: &PgPool, short_code: &str) -> DbResult<Option<RedirectRow>> {
    let row = sqlx::query_as::<_, RedirectRow>(
        r#"
        SELECT id, original_url, p_hash, expires_at
        FROM urls
        WHERE short_code = TRIM($1) AND is_active
        "#,
    )
    .bind(short_code)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Apply the server-side click counter.
pub async fn increment_clicks<'e, E>(executor: E, url_id: i64) -> DbResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("SELECT increment_url_clicks($1)")
        .bind(url_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn list_user_urls(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> DbResult<(i64, Vec<OwnedUrlRow>)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_urls WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    let urls = sqlx::query_as::<_, OwnedUrlRow>(
        r#"
        SELECT urls.id, urls.domain_id, urls.original_url, urls.short_code,
               urls.clicks, urls.title, urls.descr, urls.qrcode_url,
               urls.expires_at, urls.is_active, urls.created_at,
               uu.user_id, uu.is_favorite
        FROM urls
        JOIN user_urls uu ON uu.url_id = urls.id
        WHERE uu.user_id = $1
        ORDER BY uu.is_favorite DESC, urls.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok((total, urls))
}

pub async fn list_urls(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> DbResult<(i64, Vec<OwnedUrlRow>)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM urls")
        .fetch_one(pool)
        .await?;
    let urls = sqlx::query_as::<_, OwnedUrlRow>(
        r#"
        SELECT urls.id, urls.domain_id, urls.original_url, urls.short_code,
               urls.clicks, urls.title, urls.descr, urls.qrcode_url,
               urls.expires_at, urls.is_active, urls.created_at,
               uu.user_id, uu.is_favorite
        FROM urls
        LEFT JOIN user_urls uu ON uu.url_id = urls.id
        ORDER BY urls.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok((total, urls))
}

/// Drop the caller's ownership edge; the row itself is soft-deleted once
/// no owner remains.
pub async fn remove_ownership(pool: &PgPool, url_id: i64, user_id: Uuid) -> DbResult<()> {
    let mut tx = pool.begin().await?;
    let removed = sqlx::query("DELETE FROM user_urls WHERE url_id = $1 AND user_id = $2")
        .bind(url_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(DbError::NotFound);
    }
    sqlx::query(
        r#"
        UPDATE urls SET is_active = FALSE
        WHERE id = $1
          AND NOT EXISTS (SELECT 1 FROM user_urls WHERE url_id = $1)
        "#,
    )
    .bind(url_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn set_favorite(
    pool: &PgPool,
    url_id: i64,
    user_id: Uuid,
    is_favorite: bool,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE user_urls SET is_favorite = $3 WHERE url_id = $1 AND user_id = $2",
    )
    .bind(url_id)
    .bind(user_id)
    .bind(is_favorite)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Maintenance sweep: deactivate rows whose expiry has passed.
pub async fn soft_delete_expired(pool: &PgPool) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE urls SET is_active = FALSE
        WHERE expires_at IS NOT NULL AND expires_at < NOW() AND is_active
        "#,
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Hard delete, admin only.
pub async fn delete_url(pool: &PgPool, url_id: i64) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM urls WHERE id = $1")
        .bind(url_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
