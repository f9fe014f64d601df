//! Typed configuration for the Zar URL shortener.
//!
//! Configuration is read from environment variables exactly once at startup
//! (`AppConfig::from_env`) and never reloaded. Every section is a plain
//! struct with serde defaults so the admin surface can echo the effective
//! configuration.

pub mod cache;
pub mod database;
pub mod geoip;
pub mod object_store;
pub mod redis;
pub mod safe_browsing;
pub mod security;
pub mod server;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cache::ResponseCacheConfig;
pub use database::DatabaseConfig;
pub use geoip::GeoIpConfig;
pub use object_store::ObjectStoreConfig;
pub use redis::RedisConfig;
pub use safe_browsing::SafeBrowsingConfig;
pub use security::SecurityConfig;
pub use server::ServerConfig;

/// Errors raised while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is absent.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// A variable is present but unparseable.
    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

/// Complete configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub cache: ResponseCacheConfig,

    #[serde(default)]
    pub safe_browsing: SafeBrowsingConfig,

    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    #[serde(default)]
    pub geoip: GeoIpConfig,
}

impl AppConfig {
    /// Read every recognised environment variable. `.env` files are honoured
    /// when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let server = ServerConfig::from_env()?;
        Ok(Self {
            security: SecurityConfig::from_env(server.is_production())?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            cache: ResponseCacheConfig::from_env()?,
            safe_browsing: SafeBrowsingConfig::from_env()?,
            object_store: ObjectStoreConfig::from_env()?,
            geoip: GeoIpConfig::from_env()?,
            server,
        })
    }
}

/// Read an optional variable, parsed with `FromStr`.
pub(crate) fn env_parse<T: std::str::FromStr>(
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.is_empty() => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { var, value: raw }),
        _ => Ok(None),
    }
}

/// Read an optional string variable, treating empty as unset.
pub(crate) fn env_string(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}
