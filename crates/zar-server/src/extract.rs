//! Request extractors: session users, the admin gate, and funnel-aware
//! body extraction.

use crate::funnel::ApiError;
use crate::state::AppState;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::{header, request::Parts};
use axum::{Form, Json};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use zar_core::ServiceError;
use zar_db::users::{self, User};
use zar_security::cookies::{extract_cookie, ACCESS_COOKIE, REFRESH_COOKIE};

fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| extract_cookie(cookies, name))
        .map(str::to_string)
}

async fn user_from_access_cookie(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<User>, ApiError> {
    let Some(token) = cookie_value(parts, ACCESS_COOKIE) else {
        return Ok(None);
    };
    let Some(user_id) = state.tokens().verify_access_token(&token) else {
        return Ok(None);
    };
    Ok(users::get_user(state.db(), user_id).await?)
}

/// The authenticated caller. Rejects with 401 when the access cookie is
/// missing, invalid or points at a deleted user.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match user_from_access_cookie(parts, state).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(ApiError(ServiceError::unauthenticated(
                "Could not validate credentials",
            ))),
        }
    }
}

/// The caller if authenticated, `None` otherwise. Never rejects on
/// credential problems.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_from_access_cookie(parts, state).await?))
    }
}

/// The refresh-token cookie, parsed when present and well-formed.
pub struct RefreshTokenCookie(pub Option<Uuid>);

impl FromRequestParts<AppState> for RefreshTokenCookie {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(RefreshTokenCookie(
            cookie_value(parts, REFRESH_COOKIE).and_then(|raw| Uuid::parse_str(&raw).ok()),
        ))
    }
}

/// The admin gate: a bearer token whose subject matches the configured
/// admin password. Checked on every call.
pub struct AdminGate;

impl FromRequestParts<AppState> for AdminGate {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match token {
            Some(token) if state.tokens().verify_admin_token(token) => Ok(AdminGate),
            _ => Err(ApiError(ServiceError::forbidden("Admin access required"))),
        }
    }
}

/// JSON body extraction whose rejections flow through the funnel as 422s
/// with the parser message attached.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError(ServiceError::validation(serde_json::json!({
                "message": rejection.body_text(),
            })))),
        }
    }
}

/// Form-body counterpart of [`ApiJson`].
pub struct ApiForm<T>(pub T);

impl<T, S> FromRequest<S> for ApiForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(ApiForm(value)),
            Err(rejection) => Err(ApiError(ServiceError::validation(serde_json::json!({
                "message": rejection.body_text(),
            })))),
        }
    }
}
