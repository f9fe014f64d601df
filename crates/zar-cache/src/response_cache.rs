//! Policy half of the read-through response cache.
//!
//! Everything here is pure: eligibility rules, fingerprinting and the stored
//! envelope. The middleware in the server crate feeds requests in and ships
//! envelopes to Redis.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use zar_core::ids::md5_hex;

/// Query parameter names that disqualify a request from caching.
const SENSITIVE_PARAMS: &[&str] = &["password", "token", "key", "secret", "auth", "session"];

/// Path prefixes that are never cached.
const NO_CACHE_PATHS: &[&str] = &[
    "/api/v1/auth",
    "/api/v1/admin",
    "/favicon.ico",
    "/static",
];

/// Response headers stripped before an entry is stored.
const SENSITIVE_HEADERS: &[&str] = &["set-cookie", "authorization", "x-api-key"];

/// Raw fingerprints longer than this are md5-hashed.
const MAX_KEY_LENGTH: usize = 250;

/// Largest response body the cache will hold.
pub const MAX_CACHEABLE_BODY: usize = 1024 * 1024;

/// The request fields the cache policy looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub authorization: Option<&'a str>,
    pub accept_language: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub cache_control: Option<&'a str>,
}

impl CacheRequest<'_> {
    /// A request is cacheable iff it is a GET without sensitive query
    /// parameters, outside the no-cache prefixes, without a no-cache/no-store
    /// directive, and, when it carries Authorization, under `/public/`.
    pub fn is_cacheable(&self) -> bool {
        if self.method != "GET" {
            return false;
        }

        if let Some(query) = self.query {
            let query = query.to_ascii_lowercase();
            if SENSITIVE_PARAMS.iter().any(|p| query.contains(p)) {
                return false;
            }
        }

        if NO_CACHE_PATHS.iter().any(|p| self.path.starts_with(p)) {
            return false;
        }

        if let Some(cc) = self.cache_control {
            let cc = cc.to_ascii_lowercase();
            if cc.contains("no-cache") || cc.contains("no-store") {
                return false;
            }
        }

        if self.authorization.is_some() && !self.path.starts_with("/public/") {
            return false;
        }

        true
    }

    /// Cache key: `{prefix}` + path, query and truncated identity headers,
    /// hashed when the raw string would exceed the key budget.
    pub fn fingerprint(&self, prefix: &str) -> String {
        let mut header_values = Vec::new();
        for (name, value) in [
            ("authorization", self.authorization),
            ("accept-language", self.accept_language),
            ("user-agent", self.user_agent),
        ] {
            if let Some(value) = value {
                let clipped: String = value.chars().take(50).collect();
                header_values.push(format!("{name}:{clipped}"));
            }
        }

        let raw = format!(
            "{}?{}|{}",
            self.path,
            self.query.unwrap_or(""),
            header_values.join(",")
        );

        if raw.len() > MAX_KEY_LENGTH {
            format!("{prefix}{}", md5_hex(&raw))
        } else {
            format!("{prefix}{}", raw.replace(' ', "_").replace('/', ":"))
        }
    }
}

/// The envelope stored in Redis for a cached response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub content: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub media_type: String,
    /// Unix seconds at store time.
    pub cached_at: i64,
}

impl CachedResponse {
    /// Build an envelope, dropping sensitive headers. Returns `None` for
    /// non-2xx statuses and oversized bodies, which are never cached.
    pub fn build(
        status: u16,
        headers: &[(String, String)],
        media_type: &str,
        content: String,
    ) -> Option<Self> {
        if !(200..300).contains(&status) || content.len() > MAX_CACHEABLE_BODY {
            return None;
        }
        let headers = headers
            .iter()
            .filter(|(name, _)| !SENSITIVE_HEADERS.contains(&name.to_ascii_lowercase().as_str()))
            .cloned()
            .collect();
        Some(Self {
            content,
            status,
            headers,
            media_type: media_type.to_string(),
            cached_at: Utc::now().timestamp(),
        })
    }

    /// Entries older than twice the default TTL are evicted on read.
    pub fn is_stale(&self, default_ttl_secs: u64) -> bool {
        let age = Utc::now().timestamp() - self.cached_at;
        age > 2 * default_ttl_secs as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_request<'a>(path: &'a str, query: Option<&'a str>) -> CacheRequest<'a> {
        CacheRequest {
            method: "GET",
            path,
            query,
            ..CacheRequest::default()
        }
    }

    #[test]
    fn only_get_is_cacheable() {
        let mut req = get_request("/api/v1/url/abc/stats", None);
        assert!(req.is_cacheable());
        req.method = "POST";
        assert!(!req.is_cacheable());
    }

    #[test]
    fn sensitive_query_params_bypass() {
        assert!(!get_request("/x", Some("token=abc")).is_cacheable());
        assert!(!get_request("/x", Some("a=1&session=9")).is_cacheable());
        assert!(get_request("/x", Some("page=2")).is_cacheable());
    }

    #[test]
    fn no_cache_prefixes_bypass() {
        assert!(!get_request("/api/v1/auth/login", None).is_cacheable());
        assert!(!get_request("/api/v1/admin/users", None).is_cacheable());
        assert!(!get_request("/static/app.css", None).is_cacheable());
    }

    #[test]
    fn authorization_only_allowed_on_public() {
        let mut req = get_request("/api/v1/url/abc/stats", None);
        req.authorization = Some("Bearer xyz");
        assert!(!req.is_cacheable());
        req.path = "/public/geo";
        assert!(req.is_cacheable());
    }

    #[test]
    fn request_cache_control_bypasses() {
        let mut req = get_request("/x", None);
        req.cache_control = Some("no-store");
        assert!(!req.is_cacheable());
    }

    #[test]
    fn long_fingerprints_are_hashed() {
        let long_query = "q=".repeat(200);
        let req = get_request("/x", Some(&long_query));
        let key = req.fingerprint("cache:");
        assert!(key.len() < 64);
        assert!(key.starts_with("cache:"));
    }

    #[test]
    fn envelope_drops_sensitive_headers_and_errors() {
        let headers = vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("set-cookie".to_string(), "access_token=x".to_string()),
        ];
        let entry =
            CachedResponse::build(200, &headers, "application/json", "{}".into()).unwrap();
        assert_eq!(entry.headers.len(), 1);
        assert!(CachedResponse::build(404, &headers, "application/json", "{}".into()).is_none());
    }

    #[test]
    fn stale_after_double_ttl() {
        let mut entry =
            CachedResponse::build(200, &[], "application/json", "{}".into()).unwrap();
        assert!(!entry.is_stale(60));
        entry.cached_at -= 121;
        assert!(entry.is_stale(60));
    }
}
