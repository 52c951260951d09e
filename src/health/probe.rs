//! Backend health probing.
//!
//! # Responsibilities
//! - Probe the backend root with a short timeout
//! - Report a composite status for the gateway and the backend

use std::fmt;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde::{Serialize, Serializer};

use crate::forward::upstream::{describe, to_uri, Upstream};
use crate::observability::metrics;

/// Liveness of the backend as seen by the last probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    /// Not probed yet.
    Unknown,
    /// Backend answered 200.
    Ok,
    /// Backend answered with another status, or could not be reached.
    Error(String),
}

impl BackendStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, BackendStatus::Ok)
    }
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendStatus::Unknown => f.write_str("unknown"),
            BackendStatus::Ok => f.write_str("ok"),
            BackendStatus::Error(message) => write!(f, "error: {message}"),
        }
    }
}

impl Serialize for BackendStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// The gateway itself; always "ok" once it can answer.
    pub api_status: &'static str,
    pub whisper_status: BackendStatus,
}

impl HealthStatus {
    pub fn new(whisper_status: BackendStatus) -> Self {
        Self {
            api_status: "ok",
            whisper_status,
        }
    }

    /// 200 when the backend is up, 503 otherwise.
    pub fn http_status(&self) -> StatusCode {
        if self.whisper_status.is_ok() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new(BackendStatus::Unknown)
    }
}

impl Upstream {
    /// Probe `GET <endpoint>/` once.
    ///
    /// The connection lives inside the request future; on timeout the
    /// future is dropped, which closes it. Every path releases it.
    pub async fn probe(&self) -> BackendStatus {
        let url = self.root_url();
        let request = to_uri(&url)
            .map_err(|e| e.to_string())
            .and_then(|uri| {
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .header(header::USER_AGENT, "whisper-gateway-health-check")
                    .body(Body::empty())
                    .map_err(|e| e.to_string())
            });
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to build health check request");
                return BackendStatus::Error(e);
            }
        };

        let status = match tokio::time::timeout(self.health_timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => BackendStatus::Ok,
            Ok(Ok(response)) => {
                tracing::warn!(url = %url, status = %response.status(), "Health check failed: non-200 status");
                BackendStatus::Error(format!(
                    "received status code {}",
                    response.status().as_u16()
                ))
            }
            Ok(Err(e)) => {
                let message = describe(&e);
                tracing::warn!(url = %url, error = %message, "Health check failed: connection error");
                BackendStatus::Error(message)
            }
            Err(_) => {
                tracing::warn!(url = %url, timeout = ?self.health_timeout, "Health check failed: timeout");
                BackendStatus::Error(format!("timed out after {:?}", self.health_timeout))
            }
        };

        metrics::record_backend_health(status.is_ok());
        status
    }

    /// Probe and wrap the result for the health endpoint.
    pub async fn health(&self) -> HealthStatus {
        HealthStatus::new(self.probe().await)
    }
}
