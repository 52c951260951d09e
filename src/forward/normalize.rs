//! Reduce backend transcription JSON to the OpenAI response shape.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;

/// Requested shape of the compatibility endpoint's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// `{"text": "..."}`
    #[default]
    Json,
    /// The transcript as `text/plain`.
    Text,
}

impl ResponseFormat {
    pub fn parse(value: &str) -> Result<Self, ApiError> {
        match value.trim() {
            "" | "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(ApiError::Validation {
                field: "response_format",
                message: format!("unsupported response_format '{other}', expected 'json' or 'text'"),
            }),
        }
    }
}

/// Body of a successful compatibility response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// The only part of the backend's JSON we keep.
#[derive(Deserialize)]
struct BackendTranscript {
    #[serde(default)]
    text: Option<String>,
}

/// Parse a backend JSON body and keep only `text` (empty when absent).
pub fn normalize(body: &[u8]) -> Result<TranscriptionResponse, ApiError> {
    let transcript: BackendTranscript = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidBackendResponse(e.to_string()))?;
    Ok(TranscriptionResponse {
        text: transcript.text.unwrap_or_default(),
    })
}

impl TranscriptionResponse {
    pub fn render(self, format: ResponseFormat) -> Response {
        match format {
            ResponseFormat::Json => (StatusCode::OK, Json(self)).into_response(),
            ResponseFormat::Text => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                self.text,
            )
                .into_response(),
        }
    }
}
