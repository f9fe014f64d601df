//! Threat-intelligence API configuration.

use super::{ConfigError, env_string};
use crate::constants::SAFE_BROWSING_URL;
use serde::{Deserialize, Serialize};

/// Google Safe Browsing client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeBrowsingConfig {
    /// API key (`GOOGLE_SAFE_BROWSING_API_KEY`). When unset in
    /// development, screening is skipped entirely.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Lookup endpoint; overridable so tests can point at a stub server.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Hard timeout for the outbound call, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SafeBrowsingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SafeBrowsingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_string("GOOGLE_SAFE_BROWSING_API_KEY"),
            endpoint: env_string("SAFE_BROWSING_ENDPOINT").unwrap_or_else(default_endpoint),
            timeout_secs: default_timeout(),
        })
    }
}

fn default_endpoint() -> String {
    SAFE_BROWSING_URL.to_string()
}

fn default_timeout() -> u64 {
    5
}
