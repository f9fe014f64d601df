//! Process metrics endpoints, admin-gated.

use crate::extract::AdminGate;
use crate::funnel::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// `GET /api/v1/metrics`: counters, response times, peaks.
pub async fn snapshot(
    State(state): State<AppState>,
    _gate: AdminGate,
) -> Result<Response, ApiError> {
    Ok(Json(state.monitor().snapshot()).into_response())
}

/// `GET /api/v1/metrics/memory`: the rolling memory history.
pub async fn memory_history(
    State(state): State<AppState>,
    _gate: AdminGate,
) -> Result<Response, ApiError> {
    Ok(Json(json!({ "history": state.monitor().memory_history() })).into_response())
}

/// `GET /api/v1/metrics/cpu`: the rolling CPU history.
pub async fn cpu_history(
    State(state): State<AppState>,
    _gate: AdminGate,
) -> Result<Response, ApiError> {
    Ok(Json(json!({ "history": state.monitor().cpu_history() })).into_response())
}
