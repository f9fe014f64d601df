//! Response-cache configuration.

use super::{ConfigError, env_parse, env_string};
use serde::{Deserialize, Serialize};

/// Settings for the read-through response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseCacheConfig {
    /// Master switch (`ENABLE_CACHE=1`).
    #[serde(default)]
    pub enabled: bool,

    /// Verbose cache decisions in the logs (`CACHE_DEBUG=1`).
    #[serde(default)]
    pub debug: bool,

    /// Default TTL in seconds for cached responses.
    #[serde(default = "default_ttl")]
    pub default_ttl_secs: u64,

    /// Key prefix for cached entries.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Per-route TTL overrides, longest prefix wins.
    #[serde(default = "default_route_ttls")]
    pub route_ttls: Vec<(String, u64)>,

    /// Upper bound on concurrent background cache writes.
    #[serde(default = "default_max_concurrent_ops")]
    pub max_concurrent_ops: usize,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debug: false,
            default_ttl_secs: default_ttl(),
            prefix: default_prefix(),
            route_ttls: default_route_ttls(),
            max_concurrent_ops: default_max_concurrent_ops(),
        }
    }
}

impl ResponseCacheConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut route_ttls = default_route_ttls();
        if let Some(ttl) = env_parse("CACHE_TTL_PUBLIC")? {
            route_ttls.push(("/public".to_string(), ttl));
        }
        if let Some(ttl) = env_parse("CACHE_TTL_STATS")? {
            route_ttls.push(("/api/v1/url".to_string(), ttl));
        }
        if let Some(ttl) = env_parse("CACHE_TTL_ADMIN")? {
            route_ttls.push(("/api/v1/admin".to_string(), ttl));
        }
        Ok(Self {
            enabled: env_string("ENABLE_CACHE").as_deref() == Some("1"),
            debug: env_string("CACHE_DEBUG").as_deref() == Some("1"),
            default_ttl_secs: env_parse("CACHE_DEFAULT_TTL")?.unwrap_or_else(default_ttl),
            prefix: env_string("CACHE_PREFIX").unwrap_or_else(default_prefix),
            route_ttls,
            max_concurrent_ops: env_parse("MAX_CONCURRENT_CACHE_OPS")?
                .unwrap_or_else(default_max_concurrent_ops),
        })
    }

    /// TTL for a path, honouring the longest matching route prefix.
    pub fn ttl_for_path(&self, path: &str) -> u64 {
        self.route_ttls
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, ttl)| *ttl)
            .unwrap_or(self.default_ttl_secs)
    }
}

fn default_ttl() -> u64 {
    60
}

fn default_prefix() -> String {
    "cache:".to_string()
}

fn default_route_ttls() -> Vec<(String, u64)> {
    Vec::new()
}

fn default_max_concurrent_ops() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        let config = ResponseCacheConfig {
            route_ttls: vec![
                ("/api".to_string(), 10),
                ("/api/v1/url".to_string(), 120),
            ],
            ..ResponseCacheConfig::default()
        };
        assert_eq!(config.ttl_for_path("/api/v1/url/abc/stats"), 120);
        assert_eq!(config.ttl_for_path("/api/v1/other"), 10);
        assert_eq!(config.ttl_for_path("/healthz"), 60);
    }
}
