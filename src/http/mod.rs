//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → handlers.rs (auth extractor → forwarder → response)
//!     → response.rs (hop-by-hop stripping, streaming relay)
//!     → error.rs (failures as {"detail": ...})
//!     → Send to client
//! ```

pub mod cors;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
