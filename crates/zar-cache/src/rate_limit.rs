//! Fixed-window rate limiting backed by the cache server.
//!
//! One pipeline round-trip per check: INCR the per-client counter, refresh
//! its expiry, read the TTL back. Concurrent requests from the same client
//! are linearised at the cache server; two requests that both observe an
//! over-limit count both fail closed.

use crate::client::{CacheClient, RATE_LIMIT_PREFIX};
use crate::error::CacheError;

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Requests observed in the current window, this one included.
    pub current: i64,
    /// Seconds until the window resets.
    pub reset_secs: i64,
    /// Configured ceiling.
    pub limit: i64,
}

impl RateLimitDecision {
    pub fn allowed(&self) -> bool {
        self.current <= self.limit
    }

    /// `max(0, limit - current)`, the value of `X-RateLimit-Remaining`.
    pub fn remaining(&self) -> i64 {
        (self.limit - self.current).max(0)
    }
}

/// Fixed-window counter keyed by client identifier.
#[derive(Clone)]
pub struct RateLimiter {
    cache: CacheClient,
    limit: i64,
    window_secs: i64,
}

impl RateLimiter {
    pub fn new(cache: CacheClient, limit: i64, window_secs: i64) -> Self {
        Self {
            cache,
            limit,
            window_secs,
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Count this request against `identifier` and report the decision.
    ///
    /// Callers are expected to fail open on `Err`: a dead cache must not
    /// block traffic, but the failure is theirs to log.
    pub async fn check(&self, identifier: &str) -> Result<RateLimitDecision, CacheError> {
        let key = format!("{RATE_LIMIT_PREFIX}{identifier}");
        let (current, ttl) = self.cache.incr_with_window(&key, self.window_secs).await?;
        // TTL can read -1 if the expiry raced away; report a full window.
        let reset_secs = if ttl > 0 { ttl } else { self.window_secs };
        Ok(RateLimitDecision {
            current,
            reset_secs,
            limit: self.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_arithmetic() {
        let decision = RateLimitDecision {
            current: 201,
            reset_secs: 12,
            limit: 200,
        };
        assert!(!decision.allowed());
        assert_eq!(decision.remaining(), 0);

        let decision = RateLimitDecision {
            current: 150,
            reset_secs: 12,
            limit: 200,
        };
        assert!(decision.allowed());
        assert_eq!(decision.remaining(), 50);
    }
}
