//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional config file (TOML, loader.rs)
//!     → environment overrides (API_KEY, WHISPER_ENDPOINT, ...)
//!     → command-line flags (main.rs, shadowing their variables)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → passed into HttpServer::new, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no ambient lookups from handlers
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, read_config, ConfigError};
pub use schema::{
    AuthConfig, BackendConfig, CorsConfig, GatewayConfig, LimitsConfig, ListenerConfig,
    LogFormat, ObservabilityConfig,
};
pub use validation::{validate_config, ValidationError};
