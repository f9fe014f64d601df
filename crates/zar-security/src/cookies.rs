//! Session cookie policy.
//!
//! Both tokens travel as HttpOnly cookies on path `/`. Production gets
//! `Secure; SameSite=None` (the frontend lives on another origin);
//! development stays on `SameSite=Lax` so plain-http testing works.

use crate::tokens::SessionToken;
use zar_core::constants::{ACCESS_TOKEN_EXPIRE_HOURS, REFRESH_TOKEN_EXPIRE_DAYS};

/// Name of the access-token cookie.
pub const ACCESS_COOKIE: &str = "access_token";

/// Name of the refresh-token cookie.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Builds and parses session cookies.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    production: bool,
}

impl CookiePolicy {
    pub fn new(production: bool) -> Self {
        Self { production }
    }

    fn attributes(&self) -> &'static str {
        if self.production {
            "Path=/; HttpOnly; Secure; SameSite=None"
        } else {
            "Path=/; HttpOnly; SameSite=Lax"
        }
    }

    fn build(&self, name: &str, value: &str, max_age_secs: i64) -> String {
        format!(
            "{}={}; {}; Max-Age={}",
            name,
            value,
            self.attributes(),
            max_age_secs
        )
    }

    /// `Set-Cookie` values carrying a fresh session.
    pub fn session_cookies(&self, token: &SessionToken) -> [String; 2] {
        [
            self.build(
                ACCESS_COOKIE,
                &token.access_token,
                ACCESS_TOKEN_EXPIRE_HOURS * 3600,
            ),
            self.build(
                REFRESH_COOKIE,
                &token.refresh_token.to_string(),
                REFRESH_TOKEN_EXPIRE_DAYS * 24 * 3600,
            ),
        ]
    }

    /// `Set-Cookie` values clearing both tokens.
    pub fn clear_cookies(&self) -> [String; 2] {
        [
            self.build(ACCESS_COOKIE, "", 0),
            self.build(REFRESH_COOKIE, "", 0),
        ]
    }
}

/// Pull one cookie value out of a `Cookie` request header.
pub fn extract_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn token() -> SessionToken {
        SessionToken {
            access_token: "jwt-value".into(),
            refresh_token: Uuid::nil(),
            refresh_expires_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn production_cookies_are_secure_same_site_none() {
        let [access, refresh] = CookiePolicy::new(true).session_cookies(&token());
        assert!(access.starts_with("access_token=jwt-value; "));
        assert!(access.contains("Secure"));
        assert!(access.contains("SameSite=None"));
        assert!(refresh.contains("HttpOnly"));
    }

    #[test]
    fn development_cookies_are_lax_and_insecure() {
        let [access, _] = CookiePolicy::new(false).session_cookies(&token());
        assert!(access.contains("SameSite=Lax"));
        assert!(!access.contains("Secure"));
    }

    #[test]
    fn max_age_matches_token_lifetime() {
        let [access, refresh] = CookiePolicy::new(false).session_cookies(&token());
        assert!(access.ends_with("Max-Age=7200"));
        assert!(refresh.ends_with(&format!("Max-Age={}", 7 * 24 * 3600)));
    }

    #[test]
    fn extract_finds_the_right_cookie() {
        let header = "theme=dark; access_token=abc; refresh_token=def";
        assert_eq!(extract_cookie(header, "access_token"), Some("abc"));
        assert_eq!(extract_cookie(header, "refresh_token"), Some("def"));
        assert_eq!(extract_cookie(header, "missing"), None);
    }
}
