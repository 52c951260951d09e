//! Error responses returned to callers.
//!
//! Every failure is terminal for its request and rendered as JSON with a
//! `detail` field, the shape the compatibility endpoint's clients expect.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::security::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Malformed or incomplete request payload.
    #[error("invalid field '{field}': {message}")]
    Validation { field: &'static str, message: String },

    /// Upload exceeds `limits.max_upload_bytes`.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}")]
    Backend { status: StatusCode, body: String },

    /// The backend could not be reached or the exchange broke off.
    #[error("backend request failed: {0}")]
    Transport(String),

    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),

    #[error("backend response could not be decoded: {0}")]
    InvalidBackendResponse(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => e.status(),
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Backend { status, .. } => *status,
            ApiError::Transport(_)
            | ApiError::Timeout(_)
            | ApiError::InvalidBackendResponse(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn missing_field(field: &'static str) -> Self {
        ApiError::Validation {
            field,
            message: "field required".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Auth(_) | ApiError::Validation { .. } | ApiError::PayloadTooLarge(_) => {
                tracing::warn!(status = %status, error = %self, "Request rejected");
            }
            _ => tracing::error!(status = %status, error = %self, "Request failed"),
        }

        let body = match &self {
            ApiError::Validation { field, message } => json!({
                "detail": [{
                    "loc": ["body", field],
                    "msg": message,
                    "type": "value_error",
                }]
            }),
            ApiError::Backend { body, .. } => json!({ "detail": body }),
            other => json!({ "detail": other.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
