//! Signup, login with lockout, refresh, logout.

use crate::client_info::ClientDetails;
use crate::state::AppState;
use chrono::Duration;
use serde::Deserialize;
use uuid::Uuid;
use zar_core::constants::{LOCK_TIME_MINUTES, MAX_FAILED_ATTEMPTS, REFRESH_TOKEN_EXPIRE_DAYS};
use zar_core::{ServiceError, ServiceResult};
use zar_db::sessions as sessions_repo;
use zar_db::users::{self, User, UserLoginData};
use zar_db::DbError;
use zar_security::passwords::{hash_password, verify_password};
use zar_security::SessionToken;

/// Signup payload.
#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

fn validate_credentials(email: &str, password: &str) -> ServiceResult<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::validation(serde_json::json!({
            "email": "must be a valid email address"
        })));
    }
    if password.trim().len() < 8 {
        return Err(ServiceError::validation(serde_json::json!({
            "password": "must be at least 8 characters"
        })));
    }
    Ok(())
}

pub async fn signup(state: &AppState, new_user: UserCreate) -> ServiceResult<User> {
    validate_credentials(&new_user.email, &new_user.password)?;
    let p_hash = hash_password(&new_user.password).await?;
    match users::create_user(state.db(), &new_user.email, &p_hash).await {
        Ok(user) => Ok(user),
        Err(DbError::UniqueViolation(_)) => {
            Err(ServiceError::conflict("Email already registered"))
        }
        Err(other) => Err(other.into()),
    }
}

fn locked_error(locked_until: Option<chrono::DateTime<chrono::Utc>>) -> ServiceError {
    let until = locked_until.map(|t| t.to_rfc3339()).unwrap_or_default();
    ServiceError::forbidden(format!("Account locked until {until}"))
}

/// Outcome of one login attempt against the lockout state machine.
#[derive(Debug, PartialEq, Eq)]
enum LoginDecision {
    /// `locked_until` is still in the future: 403 regardless of password.
    Locked {
        locked_until: Option<chrono::DateTime<chrono::Utc>>,
    },
    /// Wrong password below the budget: record and answer 401. The old
    /// lock timestamp is preserved as-is.
    Failed {
        locked_until: Option<chrono::DateTime<chrono::Utc>>,
    },
    /// Wrong password at the budget: record the fresh lock and answer 403.
    FailedAndLocked {
        locked_until: chrono::DateTime<chrono::Utc>,
    },
    /// Correct password on an unlocked account.
    Success,
}

/// The pure half of the lockout state machine. An expired lock does not
/// reset the counter (only a success does), so a wrong password after
/// the lock elapses re-locks immediately while the attempt count stays
/// at the limit.
fn login_decision(
    data: &UserLoginData,
    now: chrono::DateTime<chrono::Utc>,
    password_ok: bool,
) -> LoginDecision {
    if data.locked_until.is_some_and(|until| until > now) {
        return LoginDecision::Locked {
            locked_until: data.locked_until,
        };
    }
    if password_ok {
        return LoginDecision::Success;
    }
    let attempts = data.attempts + 1;
    if attempts >= MAX_FAILED_ATTEMPTS {
        LoginDecision::FailedAndLocked {
            locked_until: now + Duration::minutes(LOCK_TIME_MINUTES),
        }
    } else {
        LoginDecision::Failed {
            locked_until: data.locked_until,
        }
    }
}

pub async fn login(
    state: &AppState,
    credentials: UserLogin,
    client: &ClientDetails,
) -> ServiceResult<(User, SessionToken)> {
    let Some(data) = users::get_login_data_by_email(state.db(), &credentials.email).await?
    else {
        return Err(ServiceError::unauthenticated("Invalid credentials"));
    };

    let now = state.clock().now();
    // A locked account answers 403 before any hash work happens.
    let still_locked = data.locked_until.is_some_and(|until| until > now);
    let password_ok = if still_locked {
        false
    } else {
        verify_password(&credentials.password, &data.p_hash).await?
    };

    match login_decision(&data, now, password_ok) {
        LoginDecision::Locked { locked_until } => {
            return Err(locked_error(locked_until));
        }
        LoginDecision::Failed { locked_until } => {
            users::register_failed_attempt(state.db(), data.id, locked_until).await?;
            return Err(ServiceError::unauthenticated("Invalid credentials"));
        }
        LoginDecision::FailedAndLocked { locked_until } => {
            users::register_failed_attempt(state.db(), data.id, Some(locked_until)).await?;
            return Err(locked_error(Some(locked_until)));
        }
        LoginDecision::Success => {}
    }

    users::reset_login_attempts(state.db(), data.id).await?;

    let token = state.tokens().mint_session(data.id)?;
    sessions_repo::upsert_session(
        state.db(),
        data.id,
        token.refresh_token,
        token.refresh_expires_at,
        &client.device_info(),
    )
    .await?;
    users::update_last_login(state.db(), data.id).await?;

    let user = User {
        id: data.id,
        email: data.email,
        created_at: data.created_at,
        last_login_at: Some(now),
    };
    Ok((user, token))
}

/// Mint a fresh access token from a live refresh cookie. The refresh
/// token value is preserved; its expiry slides forward.
pub async fn refresh(
    state: &AppState,
    refresh_cookie: Option<Uuid>,
) -> ServiceResult<(User, SessionToken)> {
    let Some(token) = refresh_cookie else {
        return Err(ServiceError::unauthenticated("Invalid refresh token"));
    };
    let Some(user) = sessions_repo::get_user_by_refresh_token(state.db(), token).await? else {
        return Err(ServiceError::unauthenticated("Invalid refresh token"));
    };

    let access_token = state.tokens().create_access_token(user.id)?;
    let refresh_expires_at = state.clock().now() + Duration::days(REFRESH_TOKEN_EXPIRE_DAYS);
    sessions_repo::extend_session(state.db(), token, refresh_expires_at).await?;

    Ok((
        user,
        SessionToken {
            access_token,
            refresh_token: token,
            refresh_expires_at,
        },
    ))
}

pub async fn logout(state: &AppState, refresh_cookie: Option<Uuid>) -> ServiceResult<()> {
    if let Some(token) = refresh_cookie {
        sessions_repo::revoke_session(state.db(), token).await?;
    }
    Ok(())
}

pub async fn logout_all(state: &AppState, user_id: Uuid) -> ServiceResult<()> {
    sessions_repo::revoke_all_sessions(state.db(), user_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use zar_core::{Clock, ManualClock};

    #[test]
    fn credential_validation_rules() {
        assert!(validate_credentials("a@example.com", "longenough").is_ok());
        assert!(validate_credentials("not-an-email", "longenough").is_err());
        assert!(validate_credentials("a@example.com", "short").is_err());
        assert!(validate_credentials("", "longenough").is_err());
    }

    fn login_data(attempts: i32, locked_until: Option<chrono::DateTime<Utc>>) -> UserLoginData {
        UserLoginData {
            id: uuid::Uuid::new_v4(),
            email: "a@example.com".into(),
            p_hash: Vec::new(),
            created_at: Utc::now(),
            last_login_at: None,
            attempts,
            last_failed_login: None,
            locked_until,
        }
    }

    #[test]
    fn failures_below_the_budget_stay_401() {
        let now = Utc::now();
        let decision = login_decision(&login_data(3, None), now, false);
        assert_eq!(decision, LoginDecision::Failed { locked_until: None });
    }

    #[test]
    fn the_tenth_failure_locks() {
        let now = Utc::now();
        let decision = login_decision(&login_data(MAX_FAILED_ATTEMPTS - 1, None), now, false);
        assert_eq!(
            decision,
            LoginDecision::FailedAndLocked {
                locked_until: now + Duration::minutes(LOCK_TIME_MINUTES)
            }
        );
    }

    #[test]
    fn locked_account_rejects_even_correct_passwords() {
        let clock = ManualClock::new(Utc::now());
        let locked_until = clock.now() + Duration::minutes(LOCK_TIME_MINUTES);
        let data = login_data(MAX_FAILED_ATTEMPTS, Some(locked_until));

        let decision = login_decision(&data, clock.now(), true);
        assert!(matches!(decision, LoginDecision::Locked { .. }));
    }

    #[test]
    fn lock_expiry_lets_a_correct_password_through() {
        let clock = ManualClock::new(Utc::now());
        let locked_until = clock.now() + Duration::minutes(LOCK_TIME_MINUTES);
        let data = login_data(MAX_FAILED_ATTEMPTS, Some(locked_until));

        clock.advance(Duration::minutes(LOCK_TIME_MINUTES + 1));
        assert_eq!(login_decision(&data, clock.now(), true), LoginDecision::Success);
    }

    #[test]
    fn lock_expiry_does_not_reset_the_counter() {
        let clock = ManualClock::new(Utc::now());
        let locked_until = clock.now() + Duration::minutes(LOCK_TIME_MINUTES);
        let data = login_data(MAX_FAILED_ATTEMPTS, Some(locked_until));

        // One more wrong password after the lock elapses re-locks at once.
        clock.advance(Duration::minutes(LOCK_TIME_MINUTES + 1));
        let decision = login_decision(&data, clock.now(), false);
        assert!(matches!(decision, LoginDecision::FailedAndLocked { .. }));
    }
}
