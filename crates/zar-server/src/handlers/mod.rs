//! HTTP handlers, grouped by route prefix.

pub mod admin;
pub mod auth;
pub mod metrics;
pub mod shortener;
pub mod user;

use crate::state::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::Json;
use serde_json::json;
use zar_security::SessionToken;

/// Attach both session cookies to an outgoing response.
pub(crate) fn set_session_cookies(
    state: &AppState,
    response: &mut Response,
    token: &SessionToken,
) {
    for cookie in state.cookies().session_cookies(token) {
        if let Ok(value) = HeaderValue::try_from(cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

/// Attach cookie-clearing headers to an outgoing response.
pub(crate) fn clear_session_cookies(state: &AppState, response: &mut Response) {
    for cookie in state.cookies().clear_cookies() {
        if let Ok(value) = HeaderValue::try_from(cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

/// Liveness probe: database round-trip plus cache ping.
pub async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = sqlx::query("SELECT 1").execute(state.db()).await.is_ok();
    let cache = state.cache().ping().await.is_ok();
    Json(json!({
        "ok": database && cache,
        "service": "zar-server",
        "database": if database { "healthy" } else { "unhealthy" },
        "cache": if cache { "healthy" } else { "unhealthy" },
    }))
}
