//! HTTP server configuration.

use super::{ConfigError, env_string};
use serde::{Deserialize, Serialize};

/// Deployment environment. `production` flips cookie policy and HSTS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Listener and deployment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. `0.0.0.0:8000`.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Deployment environment.
    #[serde(default)]
    pub env: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            env: Environment::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = match env_string("ENV").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        };
        Ok(Self {
            bind_addr: env_string("BIND_ADDR").unwrap_or_else(default_bind_addr),
            env,
        })
    }

    pub fn is_production(&self) -> bool {
        self.env == Environment::Production
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_development() {
        let config = ServerConfig::default();
        assert!(!config.is_production());
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
    }
}
