//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers and forwarders produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every request span
//! - Secrets are never logged
//! - Metrics are optional and off by default

pub mod logging;
pub mod metrics;
