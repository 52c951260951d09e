//! Authenticated gateway in front of a Whisper speech-recognition service.

pub mod config;
pub mod forward;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
