//! Postgres pool configuration.

use super::{ConfigError, env_parse, env_string};
use serde::{Deserialize, Serialize};

/// Connection-pool settings for the relational store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL (`DATABASE_URL`).
    #[serde(default = "default_url")]
    pub url: String,

    /// Minimum pooled connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Acquire timeout in seconds.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_string("DATABASE_URL").unwrap_or_else(default_url),
            min_connections: env_parse("DATABASE_MIN_CONNECTIONS")?
                .unwrap_or_else(default_min_connections),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS")?
                .unwrap_or_else(default_max_connections),
            acquire_timeout_secs: env_parse("DATABASE_ACQUIRE_TIMEOUT_SECS")?
                .unwrap_or_else(default_acquire_timeout),
        })
    }
}

fn default_url() -> String {
    "postgresql://postgres@localhost:5432/zar".to_string()
}

fn default_min_connections() -> u32 {
    5
}

fn default_max_connections() -> u32 {
    20
}

fn default_acquire_timeout() -> u64 {
    5
}
