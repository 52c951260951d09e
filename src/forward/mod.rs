//! Request forwarding to the speech-recognition backend.
//!
//! # Data Flow
//! ```text
//! POST /asr (authenticated)
//!     → passthrough.rs: stream body out, stream response back
//!
//! POST /audio/transcriptions (authenticated)
//!     → transcription.rs: read multipart, rebuild it, fixed query
//!     → normalize.rs: backend JSON → {"text": ...}
//! ```
//!
//! # Design Decisions
//! - One `Upstream` per process, built from explicit configuration
//! - No retries; every failure is terminal for the request
//! - Dropping a handler future (caller went away) drops the outbound call

pub mod normalize;
pub mod passthrough;
pub mod transcription;
pub mod upstream;

pub use normalize::{normalize, ResponseFormat, TranscriptionResponse};
pub use transcription::{transcription_query, TranscriptionUpload};
pub use upstream::{Upstream, UpstreamError};
