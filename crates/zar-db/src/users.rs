//! User accounts and login-attempt bookkeeping.

use crate::{DbError, DbResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Public view of a user. The password hash never leaves this module's
/// login-data type.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Everything the login flow needs in one row: credentials plus the
/// lockout state.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserLoginData {
    pub id: Uuid,
    pub email: String,
    pub p_hash: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub attempts: i32,
    pub last_failed_login: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
}

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> DbResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, created_at, last_login_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn get_login_data_by_email(
    pool: &PgPool,
    email: &str,
) -> DbResult<Option<UserLoginData>> {
    let data = sqlx::query_as::<_, UserLoginData>(
        r#"
        SELECT
            u.id,
            u.email,
            u.p_hash,
            u.created_at,
            u.last_login_at,
            ul.attempts,
            ul.last_failed_login,
            ul.locked_until
        FROM users u
        JOIN user_login_attempts ul ON ul.user_id = u.id
        WHERE u.email = LOWER(TRIM($1))
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(data)
}

/// Insert a new user. The login-attempts row is created by trigger.
/// A duplicate email surfaces as [`DbError::UniqueViolation`].
pub async fn create_user(pool: &PgPool, email: &str, p_hash: &[u8]) -> DbResult<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, p_hash)
        VALUES (LOWER(TRIM($1)), $2)
        RETURNING id, email, created_at, last_login_at
        "#,
    )
    .bind(email)
    .bind(p_hash)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn list_users(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> DbResult<(i64, Vec<User>)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, created_at, last_login_at
        FROM users
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok((total, users))
}

/// Remove the user; sessions, login attempts and owned url edges cascade.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Record a failed credential check, optionally locking the account.
pub async fn register_failed_attempt(
    pool: &PgPool,
    user_id: Uuid,
    locked_until: Option<DateTime<Utc>>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE user_login_attempts
        SET attempts = attempts + 1,
            last_failed_login = NOW(),
            locked_until = $2
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(locked_until)
    .execute(pool)
    .await?;
    Ok(())
}

/// A successful login clears the lockout state.
pub async fn reset_login_attempts(pool: &PgPool, user_id: Uuid) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE user_login_attempts
        SET attempts = 0,
            last_failed_login = NULL,
            locked_until = NULL,
            last_successful_login = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_last_login(pool: &PgPool, user_id: Uuid) -> DbResult<()> {
    sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
