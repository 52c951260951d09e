//! Route handlers.

use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Request, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::forward::{normalize, TranscriptionUpload};
use crate::http::error::ApiError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::{RequireApiKey, RequireBearer};

fn record<T>(endpoint: &'static str, start: Instant, result: &Result<T, ApiError>, ok: u16) {
    let status = match result {
        Ok(_) => ok,
        Err(e) => e.status().as_u16(),
    };
    metrics::record_request(endpoint, status, start);
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.upstream.health().await;
    (status.http_status(), Json(status))
}

/// `POST /asr`: stream the request to the backend and its answer back.
pub async fn asr(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    request: Request,
) -> Result<Response, ApiError> {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    tracing::info!(
        request_id = %request_id(&parts.headers),
        query = parts.uri.query().unwrap_or(""),
        "Passthrough transcription"
    );

    let result = state
        .upstream
        .forward(
            parts.method,
            parts.uri.query(),
            &parts.headers,
            body.into_data_stream(),
        )
        .await;

    let status = match &result {
        Ok(response) => response.status().as_u16(),
        Err(e) => e.status().as_u16(),
    };
    metrics::record_request("asr", status, start);
    result
}

/// `POST /audio/transcriptions`: OpenAI-compatible transcription.
pub async fn transcriptions(
    State(state): State<AppState>,
    _auth: RequireBearer,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let start = Instant::now();
    let result = transcribe(&state, multipart).await;
    record("audio_transcriptions", start, &result, 200);
    result
}

async fn transcribe(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|rejection| ApiError::Validation {
        field: "file",
        message: rejection.body_text(),
    })?;
    let upload = TranscriptionUpload::from_multipart(multipart).await?;

    tracing::info!(
        bytes = upload.file.len(),
        file_name = ?upload.file_name,
        language = ?upload.language,
        "Compatibility transcription"
    );

    let body = state.upstream.transcribe(&upload).await?;
    let transcript = normalize(&body)?;
    Ok(transcript.render(upload.response_format))
}
