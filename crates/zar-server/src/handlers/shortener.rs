//! Shorten, resolve and stats endpoints.

use crate::client_info::ClientDetails;
use crate::extract::{AdminGate, ApiForm, ApiJson, MaybeUser, RefreshTokenCookie};
use crate::funnel::ApiError;
use crate::services::redirect::{self, Resolution};
use crate::services::shorten::{self, UrlCreate, UrlResponse};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use zar_core::{Page, PageParams, ServiceError};
use zar_db::analytics;
use zar_db::urls;

/// `POST /api/v1/url`
pub async fn shorten_url(
    State(state): State<AppState>,
    client: ClientDetails,
    MaybeUser(user): MaybeUser,
    RefreshTokenCookie(refresh): RefreshTokenCookie,
    ApiJson(payload): ApiJson<UrlCreate>,
) -> Result<Response, ApiError> {
    let outcome = shorten::shorten(&state, payload, user, refresh, &client).await?;
    let mut response = Json(outcome.url).into_response();
    if let Some(token) = outcome.refreshed {
        super::set_session_cookies(&state, &mut response, &token);
    }
    Ok(response)
}

fn resolution_response(resolution: Resolution) -> Response {
    match resolution {
        Resolution::Redirect { location } => Redirect::temporary(&location).into_response(),
        Resolution::SeeOther { location } => Redirect::to(&location).into_response(),
        Resolution::Expired { location } => Redirect::temporary(&location).into_response(),
        Resolution::Challenge {
            html,
            wrong_password,
        } => {
            if wrong_password {
                (StatusCode::UNAUTHORIZED, Html(html)).into_response()
            } else {
                Html(html).into_response()
            }
        }
    }
}

/// `GET /api/v1/{short_code}`
pub async fn redirect_from_short_code(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
    client: ClientDetails,
) -> Result<Response, ApiError> {
    let resolution = redirect::resolve(&state, &short_code, &client).await?;
    Ok(resolution_response(resolution))
}

/// Password challenge form body.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    pub password: String,
}

/// `POST /api/v1/{short_code}/verify`
pub async fn verify_password(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
    client: ClientDetails,
    ApiForm(form): ApiForm<VerifyForm>,
) -> Result<Response, ApiError> {
    let resolution =
        redirect::verify_and_redirect(&state, &short_code, &form.password, &client).await?;
    Ok(resolution_response(resolution))
}

/// `GET /api/v1/url/{short_code}/stats`
pub async fn url_stats(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<Response, ApiError> {
    match analytics::url_stats(state.db(), &short_code).await? {
        Some(stats) => Ok(Json(stats).into_response()),
        None => Err(ApiError(ServiceError::not_found(format!(
            "Statistics not found for URL: {short_code}"
        )))),
    }
}

/// `GET /api/v1/url/urls`: the full listing, admin only.
pub async fn list_urls(
    State(state): State<AppState>,
    _gate: AdminGate,
    client: ClientDetails,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let params = params.clamped();
    let (total, rows) = urls::list_urls(state.db(), params.limit, params.offset).await?;
    let results: Vec<UrlResponse> = rows
        .into_iter()
        .map(|row| UrlResponse::from_owned(row, &client.base_url))
        .collect();
    Ok(Json(Page::new(total, params, results)).into_response())
}
