//! Read-through cache for idempotent GETs.
//!
//! Eligibility and fingerprinting live in `zar_cache::response_cache`;
//! this middleware is the glue: serve hits, rebuild misses, and ship the
//! write to Redis in a fire-and-forget task bounded by a semaphore.
//! Every cache failure degrades to a plain MISS.

use crate::state::AppState;
use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use zar_cache::{CacheRequest, CachedResponse};

pub async fn response_cache(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let config = &state.config().cache;
    if !config.enabled {
        return next.run(request).await;
    }

    fn header_value(request: &Request, name: &str) -> Option<String> {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
    let authorization = header_value(&request, "authorization");
    let accept_language = header_value(&request, "accept-language");
    let user_agent = header_value(&request, "user-agent");
    let cache_control = header_value(&request, "cache-control");
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let cacheable = CacheRequest {
        method: request.method().as_str(),
        path: &path,
        query: query.as_deref(),
        authorization: authorization.as_deref(),
        accept_language: accept_language.as_deref(),
        user_agent: user_agent.as_deref(),
        cache_control: cache_control.as_deref(),
    };

    if !cacheable.is_cacheable() {
        let mut response = next.run(request).await;
        set_cache_header(&mut response, "BYPASS");
        return response;
    }

    let key = cacheable.fingerprint(&config.prefix);

    // Read side. Stale entries are evicted and treated as misses.
    match state.cache().get(&key).await {
        Ok(Some(raw)) => match serde_json::from_str::<CachedResponse>(&raw) {
            Ok(entry) if !entry.is_stale(config.default_ttl_secs) => {
                if config.debug {
                    tracing::debug!(%key, "response cache hit");
                }
                return rebuild(entry, &key);
            }
            _ => {
                let _ = state.cache().delete(&key).await;
            }
        },
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(error = %err, "response cache read failed, treating as miss");
        }
    }

    let response = next.run(request).await;
    let (mut parts, body) = response.into_parts();

    // Buffer the body so it can be both cached and returned.
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return Response::from_parts(parts, Body::empty()),
    };

    if parts.status == StatusCode::OK {
        if let Ok(content) = std::str::from_utf8(&bytes) {
            let headers: Vec<(String, String)> = parts
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let media_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("application/json")
                .to_string();

            if let Some(entry) =
                CachedResponse::build(parts.status.as_u16(), &headers, &media_type, content.into())
            {
                store_entry(&state, key.clone(), entry, config.ttl_for_path(&path));
            }
        }
    }

    parts.headers.insert(
        HeaderName::from_static("x-cache"),
        HeaderValue::from_static("MISS"),
    );
    insert_key_header(&mut parts.headers, &key);
    Response::from_parts(parts, Body::from(bytes))
}

/// Fire-and-forget write, bounded by the configured semaphore. When every
/// permit is busy the write is simply dropped.
fn store_entry(state: &AppState, key: String, entry: CachedResponse, ttl: u64) {
    let Ok(permit) = state.cache_write_permits().clone().try_acquire_owned() else {
        tracing::debug!("response cache write skipped, no permits");
        return;
    };
    let cache = state.cache().clone();
    tokio::spawn(async move {
        let _permit = permit;
        match serde_json::to_string(&entry) {
            Ok(serialized) => {
                if let Err(err) = cache.set_ex(&key, &serialized, ttl).await {
                    tracing::warn!(error = %err, "response cache write failed");
                }
            }
            Err(err) => tracing::warn!(error = %err, "response cache serialisation failed"),
        }
    });
}

fn rebuild(entry: CachedResponse, key: &str) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::from_u16(entry.status).unwrap_or(StatusCode::OK));
    for (name, value) in &entry.headers {
        builder = builder.header(name, value);
    }
    let mut response = builder
        .header(header::CONTENT_TYPE, &entry.media_type)
        .header("x-cache", "HIT")
        .body(Body::from(entry.content))
        .unwrap_or_else(|_| Response::new(Body::empty()));
    insert_key_header(response.headers_mut(), key);
    response
}

fn set_cache_header(response: &mut Response, value: &'static str) {
    response.headers_mut().insert(
        HeaderName::from_static("x-cache"),
        HeaderValue::from_static(value),
    );
}

/// The last 20 characters of the key, enough to correlate with Redis.
fn insert_key_header(headers: &mut axum::http::HeaderMap, key: &str) {
    let tail: String = key
        .chars()
        .rev()
        .take(20)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if let Ok(value) = HeaderValue::try_from(tail) {
        headers.insert(HeaderName::from_static("x-cache-key"), value);
    }
}
