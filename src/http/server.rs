//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (CORS, tracing, request ID, body limits)
//! - Bind server to listener with graceful shutdown

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, FromRef},
    http::Request,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::forward::{Upstream, UpstreamError};
use crate::http::cors::cors_layer;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::{docs, handlers};
use crate::security::SharedSecret;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub secret: SharedSecret,
    pub upstream: Arc<Upstream>,
}

impl AppState {
    pub fn new(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            secret: SharedSecret::new(config.auth.api_key.as_deref()),
            upstream: Arc::new(Upstream::new(&config.backend)?),
        })
    }
}

impl FromRef<AppState> for SharedSecret {
    fn from_ref(state: &AppState) -> Self {
        state.secret.clone()
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, UpstreamError> {
        let state = AppState::new(&config)?;
        if !state.secret.is_configured() {
            tracing::warn!("No API key configured; every authenticated request will be refused");
        }
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let upload_limit = DefaultBodyLimit::max(config.limits.max_upload_bytes);

        Router::new()
            .route("/", get(docs::root_redirect))
            .route("/docs", get(docs::docs_page))
            .route("/openapi.json", get(docs::openapi_json))
            .route("/health", get(handlers::health))
            .route(
                "/asr",
                post(handlers::asr).layer(DefaultBodyLimit::disable()),
            )
            .route(
                "/audio/transcriptions",
                post(handlers::transcriptions).layer(upload_limit),
            )
            .route(
                "/v1/audio/transcriptions",
                post(handlers::transcriptions).layer(upload_limit),
            )
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(cors_layer(&config.cors)),
            )
    }

    /// The fully layered router, for embedding or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.endpoint,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
