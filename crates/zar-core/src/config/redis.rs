//! Redis connection configuration.

use super::{ConfigError, env_parse, env_string};
use serde::{Deserialize, Serialize};

/// Settings for the key/value store backing rate limits and caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub db: i64,

    /// Password, omitted when the server is unauthenticated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: 0,
            password: None,
        }
    }
}

impl RedisConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_string("REDIS_HOST").unwrap_or_else(default_host),
            port: env_parse("REDIS_PORT")?.unwrap_or_else(default_port),
            db: env_parse("REDIS_DB")?.unwrap_or(0),
            password: env_string("REDIS_PASSWORD"),
        })
    }

    /// Build a `redis://` connection URL.
    pub fn connection_url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_url_without_password() {
        let config = RedisConfig::default();
        assert_eq!(config.connection_url(), "redis://localhost:6379/0");
    }

    #[test]
    fn connection_url_with_password() {
        let config = RedisConfig {
            password: Some("hunter2".into()),
            ..RedisConfig::default()
        };
        assert_eq!(config.connection_url(), "redis://:hunter2@localhost:6379/0");
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}
