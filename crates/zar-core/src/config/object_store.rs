//! Object-store configuration for QR-code artifacts.

use super::{ConfigError, env_string};
use serde::{Deserialize, Serialize};

/// S3-compatible bucket holding generated QR codes. When `bucket` is unset
/// the QR job is disabled and shorten responses simply omit `qrcode_url`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObjectStoreConfig {
    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible stores.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing)]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing)]
    pub secret_access_key: Option<String>,

    /// Public base URL under which uploaded objects are reachable.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl ObjectStoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bucket: env_string("S3_BUCKET"),
            region: env_string("S3_REGION"),
            endpoint: env_string("S3_ENDPOINT"),
            access_key_id: env_string("S3_ACCESS_KEY_ID"),
            secret_access_key: env_string("S3_SECRET_ACCESS_KEY"),
            public_url: env_string("S3_PUBLIC_URL"),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.bucket.is_some()
    }
}
