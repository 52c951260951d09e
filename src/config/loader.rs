//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the shared secret.
pub const ENV_API_KEY: &str = "API_KEY";
/// Environment variable holding the backend base address.
pub const ENV_WHISPER_ENDPOINT: &str = "WHISPER_ENDPOINT";
/// Environment variable overriding the listener address.
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a configuration file without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the effective configuration: defaults, then the optional file,
/// then variables resolved through `lookup`, then validation.
///
/// Every validation error is reported, not just the first.
pub fn load_config<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto a configuration.
///
/// `lookup` resolves a variable name; pass `|k| std::env::var(k).ok()` in
/// production and a map lookup in tests. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(key) = non_empty(ENV_API_KEY) {
        config.auth.api_key = Some(key);
    }
    if let Some(endpoint) = non_empty(ENV_WHISPER_ENDPOINT) {
        config.backend.endpoint = endpoint;
    }
    if let Some(bind) = non_empty(ENV_BIND_ADDRESS) {
        config.listener.bind_address = bind;
    }
}
