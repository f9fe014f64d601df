//! Token signing and admin-gate configuration.

use super::{ConfigError, env_string};
use serde::{Deserialize, Serialize};

/// Secrets and token policy.
///
/// The signing algorithm is configuration, never input: tokens presented by
/// clients are only ever validated against `algorithm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HMAC signing secret for access tokens.
    #[serde(skip_serializing)]
    pub secret_key: String,

    /// JWT signing algorithm name (`HS256`).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Password for the admin gate.
    #[serde(skip_serializing)]
    pub admin_password: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: "zar-dev-secret".to_string(),
            algorithm: default_algorithm(),
            admin_password: String::new(),
        }
    }
}

impl SecurityConfig {
    /// In production both secrets are mandatory; development falls back to a
    /// fixed dev secret.
    pub fn from_env(is_production: bool) -> Result<Self, ConfigError> {
        let secret_key = match env_string("SECRET_KEY") {
            Some(key) => key,
            None if is_production => return Err(ConfigError::MissingVar("SECRET_KEY")),
            None => SecurityConfig::default().secret_key,
        };
        let admin_password = match env_string("ADMIN_PASSWORD") {
            Some(password) => password,
            None if is_production => return Err(ConfigError::MissingVar("ADMIN_PASSWORD")),
            None => String::new(),
        };
        Ok(Self {
            secret_key,
            algorithm: env_string("ALGORITHM").unwrap_or_else(default_algorithm),
            admin_password,
        })
    }
}

fn default_algorithm() -> String {
    "HS256".to_string()
}
