//! Redis-backed caching for the Zar URL shortener.
//!
//! Three concerns live here: the typed [`CacheClient`] every other component
//! talks to, the fixed-window [`RateLimiter`], and the pure policy half of
//! the read-through response cache (eligibility, fingerprinting and the
//! stored envelope). The axum glue for the response cache lives in the
//! server crate.

pub mod client;
pub mod error;
pub mod rate_limit;
pub mod response_cache;

pub use client::CacheClient;
pub use error::CacheError;
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use response_cache::{CacheRequest, CachedResponse};
