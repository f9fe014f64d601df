//! GeoIP database configuration.

use super::{ConfigError, env_string};
use serde::{Deserialize, Serialize};

/// Path to the MaxMind city database. Lookup is skipped when unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeoIpConfig {
    #[serde(default)]
    pub db_path: Option<String>,
}

impl GeoIpConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            db_path: env_string("GEOIP_DB_PATH"),
        })
    }
}
