use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use tracing::info;

use crate::relay::CLOUDINARY_URL_ENV;

use super::{types::Config, ConfigError};

/// Environment prefix for overrides, e.g. `MEDIARELAY_SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "MEDIARELAY_";

/// Load configuration from file with environment variable overrides.
///
/// A missing file is not an error: defaults plus environment apply.
/// When no relay credential is configured, `CLOUDINARY_URL` is used.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        info!("No config file at {}, using defaults", path.display());
    }

    let mut config: Config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    if config.relay.cloudinary_url.is_none() {
        config.relay.cloudinary_url = std::env::var(CLOUDINARY_URL_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty());
    }

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
