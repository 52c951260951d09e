//! Caller authentication.
//!
//! # Data Flow
//! ```text
//! Request headers
//!     → extract.rs (axum extractor per endpoint)
//!     → credentials.rs (scheme-specific extraction → one comparison)
//!     → handler runs, or 401/403 before the body is touched
//! ```

pub mod credentials;
pub mod extract;

pub use credentials::{AuthError, Credential, CredentialScheme, SharedSecret, X_API_KEY};
pub use extract::{RequireApiKey, RequireBearer};
