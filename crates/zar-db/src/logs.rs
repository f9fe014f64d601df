//! Persistent log entries and rate-limit violations.

use crate::DbResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A log entry about to be written.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub level: String,
    pub message: String,
    pub path: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<i32>,
    pub user_id: Option<Uuid>,
    pub stacktrace: Option<String>,
    pub metadata: serde_json::Value,
}

/// A stored log entry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LogEntry {
    pub id: i64,
    pub level: String,
    pub message: String,
    pub path: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<i32>,
    pub user_id: Option<Uuid>,
    pub stacktrace: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A stored rate-limit violation window.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RateLimitViolation {
    pub id: i64,
    pub ip_address: String,
    pub path: String,
    pub method: String,
    pub window_start: DateTime<Utc>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
}

pub async fn insert_log(pool: &PgPool, entry: &NewLogEntry) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO logs (
            level, message, path, method, status_code, user_id, stacktrace, metadata
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&entry.level)
    .bind(&entry.message)
    .bind(entry.path.as_deref())
    .bind(entry.method.as_deref())
    .bind(entry.status_code)
    .bind(entry.user_id)
    .bind(entry.stacktrace.as_deref())
    .bind(&entry.metadata)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_logs(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> DbResult<(i64, Vec<LogEntry>)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs")
        .fetch_one(pool)
        .await?;
    let logs = sqlx::query_as::<_, LogEntry>(
        r#"
        SELECT id, level, message, path, method, status_code, user_id,
               stacktrace, metadata, created_at
        FROM logs
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok((total, logs))
}

/// Delete log entries, optionally only those older than the given age.
pub async fn delete_logs(pool: &PgPool, older_than_minutes: Option<i64>) -> DbResult<u64> {
    let result = match older_than_minutes {
        Some(minutes) => {
            sqlx::query(
                "DELETE FROM logs WHERE created_at < NOW() - make_interval(mins => $1::int)",
            )
            .bind(minutes)
            .execute(pool)
            .await?
        }
        None => sqlx::query("DELETE FROM logs").execute(pool).await?,
    };
    Ok(result.rows_affected())
}

/// Entry counts per level, for the admin log dashboard.
pub async fn log_stats(pool: &PgPool) -> DbResult<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT level, COUNT(*) FROM logs GROUP BY level ORDER BY level")
            .fetch_all(pool)
            .await?;
    Ok(rows)
}

/// Record one more overflow for the `(ip, path, method, window)` tuple.
pub async fn upsert_violation(
    pool: &PgPool,
    ip_address: &str,
    path: &str,
    method: &str,
    window_start: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO rate_limit_violations (ip_address, path, method, window_start)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (ip_address, path, method, window_start)
        DO UPDATE SET
            attempts = rate_limit_violations.attempts + 1,
            last_attempt_at = NOW()
        "#,
    )
    .bind(ip_address)
    .bind(path)
    .bind(method)
    .bind(window_start)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_violations(
    pool: &PgPool,
    since_hours: i64,
    limit: i64,
    offset: i64,
) -> DbResult<(i64, Vec<RateLimitViolation>)> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM rate_limit_violations \
         WHERE last_attempt_at > NOW() - make_interval(hours => $1::int)",
    )
    .bind(since_hours)
    .fetch_one(pool)
    .await?;
    let violations = sqlx::query_as::<_, RateLimitViolation>(
        r#"
        SELECT id, ip_address, path, method, window_start, attempts,
               created_at, last_attempt_at
        FROM rate_limit_violations
        WHERE last_attempt_at > NOW() - make_interval(hours => $1::int)
        ORDER BY last_attempt_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(since_hours)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok((total, violations))
}
