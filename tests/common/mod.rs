//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use whisper_gateway::{GatewayConfig, HttpServer};

pub const API_KEY: &str = "test-secret";
pub const BOUNDARY: &str = "gateway-test-boundary";

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    /// Query parameters as decoded pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let url = url::Url::parse(&format!("http://backend{}", self.uri)).unwrap();
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

#[derive(Clone)]
struct Recorder {
    requests: Arc<Mutex<Vec<Captured>>>,
    asr_status: StatusCode,
    asr_body: &'static str,
    root_status: StatusCode,
}

/// A backend that records every `/asr` request and answers with fixed responses.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Captured {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("backend received no request")
    }
}

async fn record_asr(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    recorder.requests.lock().unwrap().push(Captured {
        method,
        uri,
        headers,
        body,
    });
    (
        recorder.asr_status,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::HeaderName::from_static("x-backend"), "whisper"),
        ],
        recorder.asr_body,
    )
}

async fn root(State(recorder): State<Recorder>) -> impl IntoResponse {
    (recorder.root_status, "Whisper ASR Webservice")
}

/// Serve `router` on an ephemeral local port.
pub async fn start_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Start a recording backend.
pub async fn start_mock_backend(
    asr_status: StatusCode,
    asr_body: &'static str,
    root_status: StatusCode,
) -> MockBackend {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder {
        requests: requests.clone(),
        asr_status,
        asr_body,
        root_status,
    };
    let router = Router::new()
        .route("/asr", any(record_asr))
        .route("/", get(root))
        .layer(DefaultBodyLimit::disable())
        .with_state(recorder);

    MockBackend {
        addr: start_backend(router).await,
        requests,
    }
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn config_for(backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backend.endpoint = format!("http://{}", backend);
    config.backend.request_timeout_secs = 30;
    config.backend.health_timeout_secs = 2;
    config.auth.api_key = Some(API_KEY.into());
    config
}

/// The gateway router pointed at `backend`.
pub fn gateway(backend: SocketAddr) -> Router {
    HttpServer::new(config_for(backend)).unwrap().router()
}

/// One part of a hand-built multipart body.
pub struct FormPart<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> FormPart<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }
}

/// Encode parts as `multipart/form-data` with [`BOUNDARY`].
pub fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{}\"", file_name));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// A compatibility request with the given bearer header and parts.
pub fn transcription_request(
    authorization: Option<&str>,
    parts: &[FormPart<'_>],
) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder()
        .method("POST")
        .uri("/audio/transcriptions")
        .header(header::CONTENT_TYPE, multipart_content_type());
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
