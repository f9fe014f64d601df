//! Service-wide constants.

/// Maximum requests per client within one rate-limit window.
pub const MAX_REQUESTS: i64 = 200;

/// Rate-limit window length in seconds.
pub const WINDOW_SECS: i64 = 30;

/// Maximum accepted request body, in bytes (20 MiB).
pub const MAX_BODY_SIZE: usize = 20 * 1024 * 1024;

/// Access-token lifetime.
pub const ACCESS_TOKEN_EXPIRE_HOURS: i64 = 2;

/// Refresh-token lifetime.
pub const REFRESH_TOKEN_EXPIRE_DAYS: i64 = 7;

/// Failed logins before the account is locked.
pub const MAX_FAILED_ATTEMPTS: i32 = 10;

/// Lock duration applied once the attempt budget is exhausted.
pub const LOCK_TIME_MINUTES: i64 = 16;

/// TTL for cached domain safety verdicts (6 hours).
pub const SAFE_CACHE_TTL_SECS: u64 = 6 * 60 * 60;

/// Length of generated short codes.
pub const SHORT_CODE_LEN: usize = 7;

/// Insert attempts before a short-code collision is surfaced to the client.
pub const SHORT_CODE_RETRY_BUDGET: u32 = 10;

/// Truncation applied to stored user-agent strings.
pub const USER_AGENT_MAX_LEN: usize = 255;

/// Path prefixes that must never be served from any cache.
pub const SENSITIVE_PATHS: &[&str] = &["/api/v1/auth/", "/api/v1/admin/"];

/// Google Safe Browsing v4 lookup endpoint.
pub const SAFE_BROWSING_URL: &str =
    "https://safebrowsing.googleapis.com/v4/threatMatches:find";

/// `Permissions-Policy` value attached to every response.
pub const PERMISSIONS_POLICY_HEADER: &str = "geolocation=(), microphone=(), \
     camera=(), payment=(), usb=(), magnetometer=(), gyroscope=(), \
     accelerometer=()";

/// `Content-Security-Policy` for API responses.
pub const CSP_API: &str = "default-src 'none'; frame-ancestors 'none';";

/// `Content-Security-Policy` for served HTML pages (password challenge).
pub const CSP_HTML: &str = "default-src 'self'; style-src 'self' \
     'unsafe-inline'; img-src 'self' data:; connect-src 'self'; \
     frame-ancestors 'none'; base-uri 'self'; form-action 'self';";
