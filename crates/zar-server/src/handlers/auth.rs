//! Signup, login, refresh, logout and session listing.

use crate::client_info::ClientDetails;
use crate::extract::{ApiJson, CurrentUser, RefreshTokenCookie};
use crate::funnel::ApiError;
use crate::services::sessions::{self, UserCreate, UserLogin};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use zar_core::{Page, PageParams};
use zar_db::sessions as sessions_repo;

/// `POST /api/v1/auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(new_user): ApiJson<UserCreate>,
) -> Result<Response, ApiError> {
    let user = sessions::signup(&state, new_user).await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    client: ClientDetails,
    ApiJson(credentials): ApiJson<UserLogin>,
) -> Result<Response, ApiError> {
    let (user, token) = sessions::login(&state, credentials, &client).await?;
    let mut response = Json(user).into_response();
    super::set_session_cookies(&state, &mut response, &token);
    Ok(response)
}

/// `POST /api/v1/auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    RefreshTokenCookie(refresh): RefreshTokenCookie,
) -> Result<Response, ApiError> {
    let (user, token) = sessions::refresh(&state, refresh).await?;
    let mut response = Json(user).into_response();
    super::set_session_cookies(&state, &mut response, &token);
    Ok(response)
}

/// `POST /api/v1/auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    RefreshTokenCookie(refresh): RefreshTokenCookie,
) -> Result<Response, ApiError> {
    sessions::logout(&state, refresh).await?;
    let mut response = StatusCode::OK.into_response();
    super::clear_session_cookies(&state, &mut response);
    Ok(response)
}

/// `POST /api/v1/auth/logout-all`
pub async fn logout_all(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ApiError> {
    sessions::logout_all(&state, user.id).await?;
    let mut response = StatusCode::OK.into_response();
    super::clear_session_cookies(&state, &mut response);
    Ok(response)
}

/// `GET /api/v1/auth/sessions`
pub async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let params = params.clamped();
    let (total, sessions) =
        sessions_repo::list_sessions(state.db(), user.id, params.limit, params.offset).await?;
    Ok(Json(Page::new(total, params, sessions)).into_response())
}
