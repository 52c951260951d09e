//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Refuse to start without a shared secret
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("backend.endpoint '{0}' is not a valid http:// URL")]
    InvalidEndpoint(String),

    #[error("backend.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("auth.api_key is not set (use API_KEY)")]
    MissingApiKey,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("limits.max_upload_bytes must be greater than zero")]
    ZeroUploadLimit,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let endpoint_ok = Url::parse(&config.backend.endpoint)
        .map(|url| url.scheme() == "http" && url.host_str().is_some())
        .unwrap_or(false);
    if !endpoint_ok {
        errors.push(ValidationError::InvalidEndpoint(config.backend.endpoint.clone()));
    }

    if config.backend.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_timeout_secs"));
    }
    if config.backend.health_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("health_timeout_secs"));
    }

    match config.auth.api_key.as_deref() {
        Some(key) if !key.is_empty() => {}
        _ => errors.push(ValidationError::MissingApiKey),
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.limits.max_upload_bytes == 0 {
        errors.push(ValidationError::ZeroUploadLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
