//! Axum extractors enforcing the shared secret.
//!
//! Handlers list one of these before any body extractor, so a rejected
//! request never has its body read and never reaches the backend.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::http::error::ApiError;
use crate::security::credentials::{Credential, CredentialScheme, SharedSecret};

fn authenticate<S>(
    scheme: CredentialScheme,
    parts: &Parts,
    state: &S,
) -> Result<Credential, ApiError>
where
    SharedSecret: FromRef<S>,
{
    let secret = SharedSecret::from_ref(state);
    secret.authenticate(scheme, &parts.headers).map_err(|e| {
        tracing::warn!(
            scheme = ?scheme,
            path = %parts.uri.path(),
            reason = %e,
            "Authentication failed"
        );
        ApiError::Auth(e)
    })
}

/// Requires a valid `x-api-key` header.
#[derive(Debug, Clone)]
pub struct RequireApiKey(pub Credential);

impl<S> FromRequestParts<S> for RequireApiKey
where
    S: Send + Sync,
    SharedSecret: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(CredentialScheme::ApiKeyHeader, parts, state).map(Self)
    }
}

/// Requires a valid `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct RequireBearer(pub Credential);

impl<S> FromRequestParts<S> for RequireBearer
where
    S: Send + Sync,
    SharedSecret: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(CredentialScheme::Bearer, parts, state).map(Self)
    }
}
