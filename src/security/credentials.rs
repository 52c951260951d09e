//! Shared-secret credential validation.
//!
//! Two schemes carry the same secret: a static `x-api-key` header and an
//! `Authorization: Bearer` token. Each scheme only knows how to pull a
//! candidate out of the headers; [`SharedSecret::verify`] is the single
//! comparison routine for both.

use std::fmt;
use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use subtle::ConstantTimeEq;

/// Header carrying the static API key.
pub const X_API_KEY: &str = "x-api-key";

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or one without credentials.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// `Authorization` present but not a Bearer credential.
    #[error("Invalid authentication scheme")]
    InvalidScheme,

    /// A credential was supplied (or required) and does not match.
    #[error("Could not validate credentials")]
    Forbidden,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::NotAuthenticated | AuthError::InvalidScheme => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

/// Where a credential is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    /// Raw value of the `x-api-key` header.
    ApiKeyHeader,
    /// Token of an `Authorization: Bearer <token>` header.
    Bearer,
}

impl CredentialScheme {
    /// Pull the candidate credential out of the request headers.
    ///
    /// `Ok(None)` means the scheme tolerates absence at this stage and leaves
    /// the decision to the comparison, which always rejects a missing value.
    pub fn extract<'a>(&self, headers: &'a HeaderMap) -> Result<Option<&'a str>, AuthError> {
        match self {
            CredentialScheme::ApiKeyHeader => Ok(headers
                .get(X_API_KEY)
                .and_then(|v| v.to_str().ok())),
            CredentialScheme::Bearer => {
                let value = headers
                    .get(header::AUTHORIZATION)
                    .ok_or(AuthError::NotAuthenticated)?
                    .to_str()
                    .map_err(|_| AuthError::InvalidScheme)?;
                let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
                if scheme.is_empty() {
                    return Err(AuthError::NotAuthenticated);
                }
                if !scheme.eq_ignore_ascii_case("bearer") {
                    return Err(AuthError::InvalidScheme);
                }
                let token = token.trim();
                if token.is_empty() {
                    return Err(AuthError::NotAuthenticated);
                }
                Ok(Some(token))
            }
        }
    }
}

/// A credential that passed validation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The process-wide secret both schemes are checked against.
#[derive(Clone)]
pub struct SharedSecret(Option<Arc<str>>);

impl SharedSecret {
    /// Build from configuration. An empty string counts as unset.
    pub fn new(secret: Option<&str>) -> Self {
        Self(secret.filter(|s| !s.is_empty()).map(Arc::from))
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    /// Compare a candidate against the secret in constant time.
    ///
    /// A missing candidate never matches, and nothing matches an unset secret.
    pub fn verify(&self, candidate: Option<&str>) -> Result<Credential, AuthError> {
        let (Some(secret), Some(candidate)) = (self.0.as_deref(), candidate) else {
            return Err(AuthError::Forbidden);
        };
        if bool::from(secret.as_bytes().ct_eq(candidate.as_bytes())) {
            Ok(Credential(candidate.to_string()))
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Extract with `scheme` and verify.
    pub fn authenticate(
        &self,
        scheme: CredentialScheme,
        headers: &HeaderMap,
    ) -> Result<Credential, AuthError> {
        let candidate = scheme.extract(headers)?;
        self.verify(candidate)
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedSecret")
            .field(&self.0.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
