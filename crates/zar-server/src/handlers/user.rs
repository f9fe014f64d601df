//! Endpoints for a user's own URLs.

use crate::client_info::ClientDetails;
use crate::extract::{ApiJson, CurrentUser};
use crate::funnel::ApiError;
use crate::services::shorten::UrlResponse;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use zar_core::{Page, PageParams};
use zar_db::urls;

/// `GET /api/v1/user/urls`
pub async fn list_urls(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    client: ClientDetails,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let params = params.clamped();
    let (total, rows) =
        urls::list_user_urls(state.db(), user.id, params.limit, params.offset).await?;
    let results: Vec<UrlResponse> = rows
        .into_iter()
        .map(|row| UrlResponse::from_owned(row, &client.base_url))
        .collect();
    Ok(Json(Page::new(total, params, results)).into_response())
}

/// Body for removing an owned URL.
#[derive(Debug, Deserialize)]
pub struct UrlDelete {
    pub url_id: i64,
}

/// `DELETE /api/v1/user/url`: drop ownership; the row is soft-deleted
/// once no owner remains.
pub async fn delete_url(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<UrlDelete>,
) -> Result<Response, ApiError> {
    urls::remove_ownership(state.db(), payload.url_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Body for the favourite toggle.
#[derive(Debug, Deserialize)]
pub struct FavoriteUpdate {
    pub url_id: i64,
    pub is_favorite: bool,
}

/// `PATCH /api/v1/user/url/favorite`
pub async fn set_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<FavoriteUpdate>,
) -> Result<Response, ApiError> {
    urls::set_favorite(state.db(), payload.url_id, user.id, payload.is_favorite).await?;
    Ok(Json(serde_json::json!({ "ok": true })).into_response())
}
