//! The error taxonomy every fallible operation funnels into.
//!
//! Handlers return `ServiceResult<T>`; the error arm carries everything the
//! HTTP layer needs to produce the response and the persisted log entry:
//! status code, client-facing detail, log level and structured metadata.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity attached to persisted log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }
}

/// Result alias used across services and handlers.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// A failure that has already been classified for the HTTP surface.
#[derive(Debug, Error)]
#[error("{detail}")]
pub struct ServiceError {
    /// HTTP status to answer with.
    pub status: u16,
    /// Client-facing message.
    pub detail: String,
    /// Severity for the persisted log entry.
    pub level: LogLevel,
    /// Structured context attached to the log entry.
    pub metadata: serde_json::Value,
    /// Extra response headers (rate-limit metadata, WWW-Authenticate).
    pub headers: Vec<(String, String)>,
}

impl ServiceError {
    fn new(status: u16, detail: impl Into<String>) -> Self {
        let level = if status < 500 {
            LogLevel::Warn
        } else {
            LogLevel::Error
        };
        Self {
            status,
            detail: detail.into(),
            level,
            metadata: serde_json::Value::Null,
            headers: Vec::new(),
        }
    }

    /// Malformed input: bad URL, failed validation. 400.
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(400, detail)
    }

    /// Body larger than the configured cap. 413.
    pub fn payload_too_large(max: usize) -> Self {
        Self::new(
            413,
            format!("Request entity too large. Maximum size allowed: {max} bytes"),
        )
    }

    /// Field-level validation failure. 422 with the errors in metadata.
    pub fn validation(errors: serde_json::Value) -> Self {
        let mut err = Self::new(422, "Validation error");
        err.metadata = serde_json::json!({ "errors": errors });
        err
    }

    /// Missing or invalid credentials. 401 with the Bearer challenge.
    pub fn unauthenticated(detail: impl Into<String>) -> Self {
        let mut err = Self::new(401, detail);
        err.headers
            .push(("WWW-Authenticate".into(), "Bearer".into()));
        err
    }

    /// Authenticated but not allowed: admin gate, account lockout. 403.
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(403, detail)
    }

    /// Unknown short code, missing user or stats row. 404.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, detail)
    }

    /// Duplicate email, or a short-code race that exhausted its budget. 409.
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(409, detail)
    }

    /// Fixed-window overflow. 429 with retry metadata headers.
    pub fn rate_limited(limit: i64, retry_after: i64) -> Self {
        let mut err = Self::new(
            429,
            format!("Rate limit exceeded. Try again in {retry_after} seconds."),
        );
        err.headers = vec![
            ("Retry-After".into(), retry_after.to_string()),
            ("X-RateLimit-Limit".into(), limit.to_string()),
            ("X-RateLimit-Remaining".into(), "0".into()),
            ("X-RateLimit-Reset".into(), retry_after.to_string()),
        ];
        err
    }

    /// Threat-intel API or object store unavailable. 502.
    pub fn upstream(detail: impl Into<String>) -> Self {
        Self::new(502, detail)
    }

    /// Anything unclassified. 500 with a generic detail.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(500, detail)
    }

    /// Attach structured metadata for the persisted log entry.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the derived log level (panics are logged FATAL).
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_follows_status() {
        assert_eq!(ServiceError::invalid_input("x").level, LogLevel::Warn);
        assert_eq!(ServiceError::internal("x").level, LogLevel::Error);
    }

    #[test]
    fn rate_limited_carries_retry_headers() {
        let err = ServiceError::rate_limited(200, 17);
        assert_eq!(err.status, 429);
        let names: Vec<_> = err.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"Retry-After"));
        assert!(names.contains(&"X-RateLimit-Remaining"));
    }

    #[test]
    fn unauthenticated_sets_bearer_challenge() {
        let err = ServiceError::unauthenticated("Could not validate credentials");
        assert!(
            err.headers
                .iter()
                .any(|(k, v)| k == "WWW-Authenticate" && v == "Bearer")
        );
    }
}
