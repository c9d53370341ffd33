//! Configuration for the relay service.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Relay service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Credential in `cloudinary://<key>:<secret>@<cloud>` form.
    /// Falls back to the `CLOUDINARY_URL` environment variable.
    #[serde(default)]
    pub cloudinary_url: Option<String>,

    /// Upload timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Base of the upload API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_timeout() -> u64 {
    300
}

fn default_api_base() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            cloudinary_url: None,
            timeout_secs: default_timeout(),
            api_base: default_api_base(),
        }
    }
}

impl RelayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
