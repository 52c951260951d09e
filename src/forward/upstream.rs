//! Connection details for the speech-recognition backend.

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::Body;
use axum::http::uri::{InvalidUri, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::BackendConfig;

/// Path of the transcription route on the backend.
pub const ASR_PATH: &str = "asr";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("invalid backend endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Shared handle on the backend.
///
/// Holds a raw `hyper` client for the streaming passthrough and the health
/// probe, and a `reqwest` client for the buffered multipart call.
#[derive(Debug, Clone)]
pub struct Upstream {
    endpoint: Url,
    pub(crate) client: Client<HttpConnector, Body>,
    pub(crate) http: reqwest::Client,
    pub(crate) request_timeout: Duration,
    pub(crate) health_timeout: Duration,
}

impl Upstream {
    pub fn new(config: &BackendConfig) -> Result<Self, UpstreamError> {
        let mut endpoint =
            Url::parse(&config.endpoint).map_err(|source| UpstreamError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                source,
            })?;
        // Joining relative paths replaces the last segment unless the base
        // ends with a slash.
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        endpoint.set_query(None);

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            endpoint,
            client,
            http,
            request_timeout,
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    /// `<endpoint>/asr`.
    pub fn asr_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(&format!("{}{}", self.endpoint.path(), ASR_PATH));
        url
    }

    /// `<endpoint>/asr` with `query` appended byte for byte.
    ///
    /// The query is not re-encoded; it already passed URI parsing on the
    /// way in.
    pub fn asr_uri(&self, query: Option<&str>) -> Result<Uri, InvalidUri> {
        let mut uri = self.asr_url().to_string();
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            uri.push('?');
            uri.push_str(query);
        }
        uri.parse()
    }

    /// Backend root, probed by the health check.
    pub fn root_url(&self) -> Url {
        self.endpoint.clone()
    }
}

/// Convert a parsed URL into the `http` crate's URI type.
pub(crate) fn to_uri(url: &Url) -> Result<Uri, InvalidUri> {
    url.as_str().parse()
}

/// Render an error with its whole source chain, e.g.
/// `client error (Connect): tcp connect error: Connection refused`.
pub(crate) fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
