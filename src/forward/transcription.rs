//! OpenAI-compatible transcription call.
//!
//! The caller's multipart upload is read completely, then re-sent to the
//! backend as a fresh multipart request with fixed task and output
//! parameters. Unlike the passthrough, this path buffers the upload.

use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::forward::normalize::ResponseFormat;
use crate::forward::upstream::{describe, Upstream};
use crate::http::error::ApiError;

/// Multipart field name the backend expects for the audio.
pub const BACKEND_AUDIO_FIELD: &str = "audio_file";

/// A decoded upload to the compatibility endpoint.
#[derive(Debug, Clone)]
pub struct TranscriptionUpload {
    pub file: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    /// Accepted for client compatibility; has no effect on the backend call.
    pub model: Option<String>,
    pub language: Option<String>,
    pub response_format: ResponseFormat,
}

impl TranscriptionUpload {
    /// Read all fields of a multipart upload. `file` is required.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut file = None;
        let mut file_name = None;
        let mut content_type = None;
        let mut model = None;
        let mut language = None;
        let mut response_format = ResponseFormat::Json;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match name.as_str() {
                "file" => {
                    file_name = field.file_name().map(str::to_owned);
                    content_type = field.content_type().map(str::to_owned);
                    file = Some(field.bytes().await.map_err(multipart_error)?);
                }
                "model" => model = non_empty(field.text().await.map_err(multipart_error)?),
                "language" => language = non_empty(field.text().await.map_err(multipart_error)?),
                "response_format" => {
                    response_format =
                        ResponseFormat::parse(&field.text().await.map_err(multipart_error)?)?;
                }
                other => tracing::trace!(field = %other, "Ignoring multipart field"),
            }
        }

        let file = file.ok_or_else(|| ApiError::missing_field("file"))?;
        Ok(Self {
            file,
            file_name,
            content_type,
            model,
            language,
            response_format,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::Validation {
            field: "file",
            message: err.body_text(),
        }
    }
}

/// Query parameters sent to the backend for a compatibility request.
pub fn transcription_query(language: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("task", "transcribe".to_string()),
        ("output", "json".to_string()),
        ("encode", "true".to_string()),
    ];
    if let Some(language) = language {
        query.push(("language", language.to_string()));
    }
    query
}

impl Upstream {
    /// Send an upload to the backend and return its raw JSON body.
    ///
    /// Any status other than 200 becomes [`ApiError::Backend`] carrying the
    /// backend's status and body text unchanged.
    pub async fn transcribe(&self, upload: &TranscriptionUpload) -> Result<Bytes, ApiError> {
        let mut part = Part::stream_with_length(upload.file.clone(), upload.file.len() as u64)
            .file_name(upload.file_name.clone().unwrap_or_else(|| "audio".to_string()));
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part.mime_str(content_type).map_err(|e| ApiError::Validation {
                field: "file",
                message: format!("invalid content type: {e}"),
            })?;
        }
        let form = Form::new().part(BACKEND_AUDIO_FIELD, part);

        let url = self.asr_url();
        let query = transcription_query(upload.language.as_deref());

        tracing::debug!(
            url = %url,
            bytes = upload.file.len(),
            language = ?upload.language,
            model = ?upload.model,
            "Sending transcription to backend"
        );

        let response = self
            .http
            .post(url)
            .query(&query)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.map_err(|e| self.request_error(e))?;
            tracing::warn!(status = %status, "Backend rejected transcription");
            return Err(ApiError::Backend { status, body });
        }

        response.bytes().await.map_err(|e| self.request_error(e))
    }

    fn request_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.request_timeout)
        } else {
            ApiError::Transport(describe(&err))
        }
    }
}
