//! The edge pipeline every request traverses.
//!
//! In order: body cap, client identity, rate limit, dispatch, security
//! headers, timing and monitor counters. Documentation routes are exempt.

use crate::client_info::ClientDetails;
use crate::funnel;
use crate::state::AppState;
use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::time::Instant;
use zar_cache::RateLimitDecision;
use zar_core::constants::{
    CSP_API, CSP_HTML, MAX_BODY_SIZE, PERMISSIONS_POLICY_HEADER, SENSITIVE_PATHS,
};
use zar_core::ServiceError;
use zar_db::logs;

const DOCS_PATHS: &[&str] = &["/docs", "/openapi.json", "/redoc"];

pub async fn edge_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if DOCS_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().to_string();
    let query = request.uri().query().map(str::to_string);
    let client_meta = funnel::request_metadata(&request);
    let is_production = state.config().server.is_production();

    let (parts, body) = request.into_parts();
    let details = ClientDetails::from_parts(&parts, is_production);

    // Declared-length fast path, then stream with the cap. The buffered
    // bytes are handed on so downstream extractors see the whole body.
    let declared_over = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len > MAX_BODY_SIZE);
    if declared_over {
        let error = Arc::new(ServiceError::payload_too_large(MAX_BODY_SIZE));
        funnel::report(&state, &method, &path, query, client_meta, &error);
        let response = funnel::funnelled_response(&path, &error);
        return finalise(&state, response, &path, start, None);
    }

    let bytes = match to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let error = Arc::new(ServiceError::payload_too_large(MAX_BODY_SIZE));
            funnel::report(&state, &method, &path, query, client_meta, &error);
            let response = funnel::funnelled_response(&path, &error);
            return finalise(&state, response, &path, start, None);
        }
    };
    let request = Request::from_parts(parts, Body::from(bytes));

    // Rate limit. A dead cache fails open but loudly.
    let decision = match state.rate_limiter().check(&details.ip).await {
        Ok(decision) => Some(decision),
        Err(err) => {
            tracing::error!(error = %err, client = %details.ip, "rate limiter unavailable, failing open");
            None
        }
    };

    if let Some(decision) = decision {
        if !decision.allowed() {
            record_violation(&state, &details.ip, &path, &method, &decision);
            let error = Arc::new(ServiceError::rate_limited(
                decision.limit,
                decision.reset_secs,
            ));
            funnel::report(&state, &method, &path, query, client_meta, &error);
            let response = funnel::funnelled_response(&path, &error);
            return finalise(&state, response, &path, start, Some(decision));
        }
    }

    let response = next.run(request).await;
    finalise(&state, response, &path, start, decision)
}

/// Upsert the violation row for this window in a detached task.
fn record_violation(
    state: &AppState,
    ip: &str,
    path: &str,
    method: &str,
    decision: &RateLimitDecision,
) {
    tracing::warn!(
        client = %ip,
        %path,
        current = decision.current,
        limit = decision.limit,
        "rate limit exceeded"
    );
    let pool = state.db().clone();
    let window = state.rate_limiter().window_secs();
    let elapsed = (window - decision.reset_secs).clamp(0, window);
    let window_start = Utc::now() - Duration::seconds(elapsed);
    let (ip, path, method) = (ip.to_string(), path.to_string(), method.to_string());
    tokio::spawn(async move {
        if let Err(err) = logs::upsert_violation(&pool, &ip, &path, &method, window_start).await {
            tracing::error!(error = %err, "failed to record rate limit violation");
        }
    });
}

/// Attach security headers, rate-limit headers and timing, and feed the
/// monitor. Applied to every response leaving the edge.
fn finalise(
    state: &AppState,
    mut response: Response,
    path: &str,
    start: Instant,
    decision: Option<RateLimitDecision>,
) -> Response {
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));

    apply_security_headers(
        response.headers_mut(),
        path,
        is_html,
        state.config().server.is_production(),
    );

    if let Some(decision) = decision {
        let headers = response.headers_mut();
        headers.insert("X-RateLimit-Limit", int_header(decision.limit));
        headers.insert("X-RateLimit-Remaining", int_header(decision.remaining()));
        headers.insert("X-RateLimit-Reset", int_header(decision.reset_secs));
    }

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::try_from(format!("{elapsed_ms:.2}ms")) {
        response.headers_mut().insert("X-Response-Time", value);
    }
    state.monitor().increment_request(elapsed_ms);

    response
}

fn int_header(value: i64) -> HeaderValue {
    HeaderValue::try_from(value.to_string()).unwrap_or(HeaderValue::from_static("0"))
}

/// The fixed security-header set.
pub fn apply_security_headers(
    headers: &mut HeaderMap,
    path: &str,
    is_html: bool,
    is_production: bool,
) {
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static(PERMISSIONS_POLICY_HEADER),
    );

    if is_production {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains; preload"),
        );
    }

    // Served HTML (the password challenge) needs its inline styles; API
    // responses lock everything down.
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(if is_html { CSP_HTML } else { CSP_API }),
    );

    let is_sensitive = SENSITIVE_PATHS.iter().any(|p| path.starts_with(p));
    if is_sensitive || path.starts_with("/api/") {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert("Pragma", HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    } else if path.starts_with("/static/") {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000, immutable"),
        );
    } else {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_paths_get_locked_down_headers() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, "/api/v1/url", false, false);
        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
        assert_eq!(headers.get("Content-Security-Policy").unwrap(), CSP_API);
        assert!(headers
            .get(header::CACHE_CONTROL)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("no-store"));
        assert!(headers.get("Strict-Transport-Security").is_none());
    }

    #[test]
    fn production_adds_hsts() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, "/api/v1/url", false, true);
        assert!(headers
            .get("Strict-Transport-Security")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("max-age=31536000"));
    }

    #[test]
    fn html_responses_keep_inline_styles_usable() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, "/api/v1/abc1234", true, false);
        assert_eq!(headers.get("Content-Security-Policy").unwrap(), CSP_HTML);
    }

    #[test]
    fn static_assets_are_immutable() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, "/static/app.css", false, false);
        assert!(headers
            .get(header::CACHE_CONTROL)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("immutable"));
    }
}
