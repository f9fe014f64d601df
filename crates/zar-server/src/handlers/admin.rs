//! Administrative endpoints, all behind the admin gate.

use crate::extract::{AdminGate, ApiJson};
use crate::funnel::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use zar_core::{Page, PageParams, ServiceError};
use zar_db::{domains, logs, tags, urls, users};

/// Admin-login body.
#[derive(Debug, Deserialize)]
pub struct AdminLogin {
    pub password: String,
}

/// `POST /api/v1/admin/admin-login`: exchange the admin password for the
/// gate token.
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(login): ApiJson<AdminLogin>,
) -> Result<Response, ApiError> {
    let configured = &state.config().security.admin_password;
    if configured.is_empty() || login.password != *configured {
        return Err(ApiError(ServiceError::forbidden("Admin access required")));
    }
    let token = state.tokens().create_admin_token()?;
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })).into_response())
}

/// `GET /api/v1/admin/users`
pub async fn list_users(
    State(state): State<AppState>,
    _gate: AdminGate,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let params = params.clamped();
    let (total, result) = users::list_users(state.db(), params.limit, params.offset).await?;
    Ok(Json(Page::new(total, params, result)).into_response())
}

/// `DELETE /api/v1/admin/users/{user_id}`: cascades to sessions and
/// owned URL edges.
pub async fn delete_user(
    State(state): State<AppState>,
    _gate: AdminGate,
    Path(user_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    users::delete_user(state.db(), user_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `GET /api/v1/admin/logs`
pub async fn list_logs(
    State(state): State<AppState>,
    _gate: AdminGate,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let params = params.clamped();
    let (total, result) = logs::list_logs(state.db(), params.limit, params.offset).await?;
    Ok(Json(Page::new(total, params, result)).into_response())
}

/// Query for the log purge.
#[derive(Debug, Deserialize)]
pub struct LogDeleteParams {
    #[serde(default)]
    pub interval_minutes: Option<i64>,
}

/// `DELETE /api/v1/admin/logs`
pub async fn delete_logs(
    State(state): State<AppState>,
    _gate: AdminGate,
    Query(params): Query<LogDeleteParams>,
) -> Result<Response, ApiError> {
    let deleted = logs::delete_logs(state.db(), params.interval_minutes).await?;
    Ok(Json(json!({ "deleted": deleted })).into_response())
}

/// `GET /api/v1/admin/logs/stats`
pub async fn log_stats(
    State(state): State<AppState>,
    _gate: AdminGate,
) -> Result<Response, ApiError> {
    let stats = logs::log_stats(state.db()).await?;
    let by_level: serde_json::Map<String, serde_json::Value> = stats
        .into_iter()
        .map(|(level, count)| (level, json!(count)))
        .collect();
    Ok(Json(json!({ "by_level": by_level })).into_response())
}

/// Query for the violation listing.
#[derive(Debug, Deserialize)]
pub struct ViolationParams {
    #[serde(default = "default_violation_hours")]
    pub hours: i64,
    #[serde(default = "default_violation_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_violation_hours() -> i64 {
    24
}

fn default_violation_limit() -> i64 {
    64
}

/// `GET /api/v1/admin/rate-limit-violations`
pub async fn list_violations(
    State(state): State<AppState>,
    _gate: AdminGate,
    Query(params): Query<ViolationParams>,
) -> Result<Response, ApiError> {
    let page = PageParams {
        limit: params.limit,
        offset: params.offset,
    }
    .clamped();
    let (total, result) =
        logs::list_violations(state.db(), params.hours.max(1), page.limit, page.offset).await?;
    Ok(Json(Page::new(total, page, result)).into_response())
}

/// `GET /api/v1/admin/domains`
pub async fn list_domains(
    State(state): State<AppState>,
    _gate: AdminGate,
    Query(params): Query<PageParams>,
) -> Result<Response, ApiError> {
    let params = params.clamped();
    let (total, result) = domains::list_domains(state.db(), params.limit, params.offset).await?;
    Ok(Json(Page::new(total, params, result)).into_response())
}

/// Body for the domain safety override.
#[derive(Debug, Deserialize)]
pub struct DomainUpdate {
    pub id: i64,
    pub is_secure: bool,
}

/// `PUT /api/v1/admin/domains`: flipping a domain insecure deletes its
/// URLs, exactly like a threat-intel match.
pub async fn update_domain(
    State(state): State<AppState>,
    _gate: AdminGate,
    ApiJson(update): ApiJson<DomainUpdate>,
) -> Result<Response, ApiError> {
    let urls_deleted = domains::set_secure(state.db(), update.id, update.is_secure).await?;
    Ok(Json(json!({ "urls_deleted": urls_deleted })).into_response())
}

/// `GET /api/v1/admin/urls/{url_id}/tags`
pub async fn url_tags(
    State(state): State<AppState>,
    _gate: AdminGate,
    Path(url_id): Path<i64>,
) -> Result<Response, ApiError> {
    let tags = tags::url_tags(state.db(), url_id).await?;
    Ok(Json(tags).into_response())
}

/// `DELETE /api/v1/admin/urls/{url_id}`: hard delete.
pub async fn delete_url(
    State(state): State<AppState>,
    _gate: AdminGate,
    Path(url_id): Path<i64>,
) -> Result<Response, ApiError> {
    urls::delete_url(state.db(), url_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `POST /api/v1/admin/urls/expire`: deactivate every expired row.
pub async fn expire_urls(
    State(state): State<AppState>,
    _gate: AdminGate,
) -> Result<Response, ApiError> {
    let deactivated = urls::soft_delete_expired(state.db()).await?;
    Ok(Json(json!({ "deactivated": deactivated })).into_response())
}

/// `GET /api/v1/admin/cache/stats`
pub async fn cache_stats(
    State(state): State<AppState>,
    _gate: AdminGate,
) -> Result<Response, ApiError> {
    let config = &state.config().cache;
    let pattern = format!("{}*", config.prefix);
    let total = state.cache().count_keys(&pattern).await?;
    Ok(Json(json!({
        "total_cached_keys": total,
        "cache_prefix": config.prefix,
        "default_ttl": config.default_ttl_secs,
        "enabled": config.enabled,
    }))
    .into_response())
}

/// `DELETE /api/v1/admin/cache`: drop every cached response.
pub async fn clear_cache(
    State(state): State<AppState>,
    _gate: AdminGate,
) -> Result<Response, ApiError> {
    let pattern = format!("{}*", state.config().cache.prefix);
    let deleted = state.cache().delete_by_pattern(&pattern).await?;
    Ok(Json(json!({ "deleted": deleted })).into_response())
}

/// `GET /api/v1/admin/cache/health`
pub async fn cache_health(
    State(state): State<AppState>,
    _gate: AdminGate,
) -> Result<Response, ApiError> {
    let health = state.cache().health_check(&state.config().cache.prefix).await;
    Ok(Json(health).into_response())
}
