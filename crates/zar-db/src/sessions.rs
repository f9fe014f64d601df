//! Refresh-token sessions, one row per `(user, device_ip, user_agent)`.

use crate::users::User;
use crate::DbResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Device fingerprint captured at login.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub device_name: Option<String>,
    pub device_ip: String,
    pub user_agent: Option<String>,
}

/// A stored session, as shown in the user's session listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Session {
    pub user_id: Uuid,
    pub refresh_token: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub device_name: String,
    pub device_ip: String,
    pub user_agent: String,
    pub last_used_at: DateTime<Utc>,
}

/// Store a refresh token for the device, replacing any previous session
/// from the same `(user, ip, user-agent)` tuple.
pub async fn upsert_session(
    pool: &PgPool,
    user_id: Uuid,
    refresh_token: Uuid,
    expires_at: DateTime<Utc>,
    device: &DeviceInfo,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO user_session_tokens (
            user_id, refresh_token, expires_at, device_name, device_ip, user_agent
        )
        VALUES ($1, $2, $3, COALESCE($4, 'unknown'), $5, COALESCE($6, ''))
        ON CONFLICT (user_id, device_ip, user_agent)
        DO UPDATE SET
            refresh_token = EXCLUDED.refresh_token,
            expires_at = EXCLUDED.expires_at,
            device_name = EXCLUDED.device_name,
            revoked = FALSE,
            revoked_at = NULL,
            last_used_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(refresh_token)
    .bind(expires_at)
    .bind(device.device_name.as_deref())
    .bind(&device.device_ip)
    .bind(device.user_agent.as_deref())
    .execute(pool)
    .await?;
    Ok(())
}

/// Resolve a live (unrevoked, unexpired) refresh token to its user.
pub async fn get_user_by_refresh_token(
    pool: &PgPool,
    refresh_token: Uuid,
) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.email, u.created_at, u.last_login_at
        FROM users u
        JOIN user_session_tokens st ON st.user_id = u.id
        WHERE st.refresh_token = $1
          AND NOT st.revoked
          AND st.expires_at > NOW()
        "#,
    )
    .bind(refresh_token)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Push the session's expiry forward and stamp activity. Used by refresh
/// and by the silent-refresh path; the token value itself is preserved.
pub async fn extend_session(
    pool: &PgPool,
    refresh_token: Uuid,
    expires_at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE user_session_tokens
        SET expires_at = $2, last_used_at = NOW()
        WHERE refresh_token = $1
        "#,
    )
    .bind(refresh_token)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn revoke_session(pool: &PgPool, refresh_token: Uuid) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE user_session_tokens
        SET revoked = TRUE, revoked_at = NOW()
        WHERE refresh_token = $1 AND NOT revoked
        "#,
    )
    .bind(refresh_token)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn revoke_all_sessions(pool: &PgPool, user_id: Uuid) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE user_session_tokens
        SET revoked = TRUE, revoked_at = NOW()
        WHERE user_id = $1 AND NOT revoked
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_sessions(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> DbResult<(i64, Vec<Session>)> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_session_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    let sessions = sqlx::query_as::<_, Session>(
        r#"
        SELECT user_id, refresh_token, issued_at, expires_at, revoked,
               revoked_at, device_name, device_ip, user_agent, last_used_at
        FROM user_session_tokens
        WHERE user_id = $1
        ORDER BY last_used_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok((total, sessions))
}
