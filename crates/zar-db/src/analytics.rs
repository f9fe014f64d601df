//! Append-only click events and their aggregation.

use crate::DbResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// One resolved click, ready to persist.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub url_id: i64,
    pub ip_address: Option<String>,
    pub country_code: Option<String>,
    pub city: Option<String>,
    /// Already truncated to the storage limit by the ingest layer.
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub device_type: String,
    pub browser: Option<String>,
    pub os: Option<String>,
}

/// Aggregated statistics for one short code.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UrlStats {
    pub short_code: String,
    pub total_clicks: i64,
    pub unique_visitors: i64,
    pub clicks_today: i64,
    pub first_click: Option<DateTime<Utc>>,
    pub last_click: Option<DateTime<Utc>>,
    pub browsers: serde_json::Value,
    pub operating_systems: serde_json::Value,
    pub device_types: serde_json::Value,
    pub countries: serde_json::Value,
}

/// Insert one analytic row. Runs on whatever executor the caller hands in
/// so the redirect path can group it with the click-counter update.
pub async fn insert_click<'e, E>(executor: E, event: &ClickEvent) -> DbResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO url_analytics (
            url_id, ip_address, country_code, city, user_agent,
            referer, device_type, browser, os
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(event.url_id)
    .bind(event.ip_address.as_deref())
    .bind(event.country_code.as_deref())
    .bind(event.city.as_deref())
    .bind(event.user_agent.as_deref())
    .bind(event.referer.as_deref())
    .bind(&event.device_type)
    .bind(event.browser.as_deref())
    .bind(event.os.as_deref())
    .execute(executor)
    .await?;
    Ok(())
}

/// Aggregate stats for a short code. `None` when the code itself is
/// unknown; a known code with no clicks yet reports zeros.
pub async fn url_stats(pool: &PgPool, short_code: &str) -> DbResult<Option<UrlStats>> {
    let stats = sqlx::query_as::<_, UrlStats>(
        r#"
        SELECT
            urls.short_code,
            COUNT(a.id) AS total_clicks,
            COUNT(DISTINCT a.ip_address) AS unique_visitors,
            COUNT(a.id) FILTER (WHERE DATE(a.clicked_at) = CURRENT_DATE) AS clicks_today,
            MIN(a.clicked_at) AS first_click,
            MAX(a.clicked_at) AS last_click,
            COALESCE(jsonb_agg(DISTINCT a.browser) FILTER (WHERE a.browser IS NOT NULL),
                     '[]'::jsonb) AS browsers,
            COALESCE(jsonb_agg(DISTINCT a.os) FILTER (WHERE a.os IS NOT NULL),
                     '[]'::jsonb) AS operating_systems,
            COALESCE(jsonb_agg(DISTINCT a.device_type) FILTER (WHERE a.device_type IS NOT NULL),
                     '[]'::jsonb) AS device_types,
            COALESCE(jsonb_agg(DISTINCT a.country_code) FILTER (WHERE a.country_code IS NOT NULL),
                     '[]'::jsonb) AS countries
        FROM urls
        LEFT JOIN url_analytics a ON a.url_id = urls.id
        WHERE urls.short_code = TRIM($1)
        GROUP BY urls.short_code
        "#,
    )
    .bind(short_code)
    .fetch_optional(pool)
    .await?;
    Ok(stats)
}
