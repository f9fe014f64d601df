//! The error funnel.
//!
//! Every failure (handler errors, validation rejections, panics) ends up
//! here as a [`ServiceError`]. The funnel middleware turns it into the
//! uniform `{detail, path, status_code, timestamp}` body, bumps the error
//! counter and persists a log entry without ever delaying the response:
//! the database write runs in a detached task and falls back to the
//! process log when the pool is unavailable.

use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use std::any::Any;
use std::sync::Arc;
use zar_core::{LogLevel, ServiceError};
use zar_db::logs::{self, NewLogEntry};

/// Handler-side error type. Anything convertible to [`ServiceError`]
/// bubbles up with `?`.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl<E: Into<ServiceError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

/// Marker the funnel middleware picks out of the response.
#[derive(Clone)]
pub struct FunneledError(pub Arc<ServiceError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (
            status,
            Json(serde_json::json!({
                "detail": self.0.detail,
                "status_code": self.0.status,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
            .into_response();
        for (name, value) in &self.0.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
        response
            .extensions_mut()
            .insert(FunneledError(Arc::new(self.0)));
        response
    }
}

/// Middleware that finalises funnelled errors: fills in the request path,
/// persists the log entry and counts the error.
pub async fn error_funnel(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let client_meta = request_metadata(&request);

    let response = next.run(request).await;

    let Some(FunneledError(error)) = response.extensions().get::<FunneledError>().cloned()
    else {
        return response;
    };

    report(&state, &method, &path, query, client_meta, &error);
    funnelled_response(&path, &error)
}

/// Count, trace and persist one funnelled error.
pub fn report(
    state: &AppState,
    method: &str,
    path: &str,
    query: Option<String>,
    client_meta: serde_json::Value,
    error: &Arc<ServiceError>,
) {
    state.monitor().increment_error();

    match error.level {
        LogLevel::Fatal | LogLevel::Error => {
            tracing::error!(status = error.status, %method, %path, detail = %error.detail, "request failed")
        }
        _ => {
            tracing::warn!(status = error.status, %method, %path, detail = %error.detail, "request failed")
        }
    }

    persist_log(state, method, path, query, client_meta, error);
}

/// The uniform funnel body, with the request path filled in.
pub fn funnelled_response(path: &str, error: &ServiceError) -> Response {
    let status =
        StatusCode::from_u16(error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (
        status,
        Json(serde_json::json!({
            "detail": error.detail,
            "path": path,
            "status_code": error.status,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
        .into_response();
    for (name, value) in &error.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

pub(crate) fn request_metadata(request: &Request) -> serde_json::Value {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    serde_json::json!({
        "user_agent": header("user-agent"),
        "referer": header("referer"),
        "content_type": header("content-type"),
        "host": header("host"),
        "client_ip": header("x-forwarded-for").or_else(|| header("x-real-ip")),
    })
}

/// Write the log entry in a detached task; the response never waits on it.
fn persist_log(
    state: &AppState,
    method: &str,
    path: &str,
    query: Option<String>,
    client_meta: serde_json::Value,
    error: &Arc<ServiceError>,
) {
    let pool = state.db().clone();
    let error = Arc::clone(error);
    let method = method.to_string();
    let path = path.to_string();

    tokio::spawn(async move {
        let mut metadata = client_meta;
        if let Some(obj) = metadata.as_object_mut() {
            if let Some(query) = query {
                obj.insert("query".into(), serde_json::Value::String(query));
            }
            if !error.metadata.is_null() {
                obj.insert("context".into(), error.metadata.clone());
            }
        }

        let entry = NewLogEntry {
            level: error.level.as_str().to_string(),
            message: error.detail.clone(),
            path: Some(path),
            method: Some(method),
            status_code: Some(error.status as i32),
            user_id: None,
            stacktrace: None,
            metadata,
        };

        if let Err(err) = logs::insert_log(&pool, &entry).await {
            // Last resort: the process log. The user response is long gone.
            tracing::error!(error = %err, entry = ?entry.message, "failed to persist log entry");
        }
    });
}

/// Response builder for the panic-catching layer. The extension makes the
/// funnel middleware persist it at FATAL.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    };

    ApiError(
        ServiceError::internal("Internal server error")
            .with_level(LogLevel::Fatal)
            .with_metadata(serde_json::json!({ "panic": message })),
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_response_carries_status_and_marker() {
        let response = ApiError(ServiceError::not_found("Unknown short code")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<FunneledError>().is_some());
    }

    #[test]
    fn rate_limit_headers_survive_into_response() {
        let response = ApiError(ServiceError::rate_limited(200, 12)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get("Retry-After").unwrap(),
            &HeaderValue::from_static("12")
        );
        assert_eq!(
            response.headers().get("X-RateLimit-Remaining").unwrap(),
            &HeaderValue::from_static("0")
        );
    }

    #[test]
    fn panic_response_is_fatal_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let FunneledError(error) = response.extensions().get::<FunneledError>().unwrap();
        assert_eq!(error.level, LogLevel::Fatal);
    }
}
