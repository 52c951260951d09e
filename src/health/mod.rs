//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → probe.rs: GET <backend>/ with a short timeout
//!     → HealthStatus { api_status, whisper_status }
//!     → 200 if the backend answered 200, else 503
//! ```
//!
//! # Design Decisions
//! - Probed on demand; no background monitor or cached state
//! - Probe failures are reported, never raised

pub mod probe;

pub use probe::{BackendStatus, HealthStatus};
