//! Streaming passthrough to the backend's `/asr` route.
//!
//! Neither the upload nor the transcription result is held in memory: the
//! inbound body is handed to the outbound request as a stream of chunks and
//! the backend's body is handed back to the caller the same way.

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Response};
use axum::BoxError;
use bytes::Bytes;
use futures_util::TryStream;

use crate::forward::upstream::{describe, Upstream};
use crate::http::error::ApiError;
use crate::http::response::{forwardable_headers, relay};

impl Upstream {
    /// Forward a request to `<endpoint>/asr` and relay the response.
    ///
    /// `body` may be any finite sequence of byte chunks; it is consumed as
    /// the backend reads it. The request timeout bounds the wait for the
    /// response headers and then the wait for each chunk of the response
    /// body. Transport failures are not retried.
    pub async fn forward<S>(
        &self,
        method: Method,
        query: Option<&str>,
        headers: &HeaderMap,
        body: S,
    ) -> Result<Response<Body>, ApiError>
    where
        S: TryStream + Send + 'static,
        S::Ok: Into<Bytes>,
        S::Error: Into<BoxError>,
    {
        let uri = self
            .asr_uri(query)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let url = uri.clone();

        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from_stream(body))
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        *request.headers_mut() = forwardable_headers(headers);

        tracing::debug!(
            url = %url,
            method = %request.method(),
            "Forwarding request to backend"
        );

        let response = match tokio::time::timeout(self.request_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(url = %url, error = %describe(&e), "Backend request failed");
                return Err(ApiError::Transport(describe(&e)));
            }
            Err(_) => {
                tracing::error!(url = %url, timeout = ?self.request_timeout, "Backend timed out");
                return Err(ApiError::Timeout(self.request_timeout));
            }
        };

        tracing::debug!(status = %response.status(), "Relaying backend response");
        Ok(relay(response, self.request_timeout))
    }
}
