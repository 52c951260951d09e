//! Header hygiene for proxied messages.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Relay backend responses without buffering the body
//! - Cut off a relayed body that stops producing data
//!
//! # Design Decisions
//! - Headers named by `Connection` are hop-by-hop too
//! - `Host` is never forwarded; the client derives it from the backend URI

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Response};
use axum::BoxError;
use futures_util::StreamExt;
use hyper::body::Incoming;

/// Headers that describe a single transport hop (RFC 9110 §7.6.1).
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Copy the inbound headers that may travel to the backend.
pub fn forwardable_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers
}

/// Turn a backend response into a client response, streaming the body.
///
/// Each chunk must arrive within `idle` of the previous one; otherwise the
/// body ends with an error and the backend connection is dropped.
pub fn relay(response: Response<Incoming>, idle: Duration) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, with_idle_timeout(Body::new(body), idle))
}

/// Re-stream `body`, failing it when no chunk arrives within `idle`.
pub fn with_idle_timeout(body: Body, idle: Duration) -> Body {
    let chunks = body.into_data_stream();
    let timed = futures_util::stream::unfold(Some(chunks), move |state| async move {
        let mut chunks = state?;
        match tokio::time::timeout(idle, chunks.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(chunks))),
            Ok(Some(Err(e))) => Some((Err(BoxError::from(e)), None)),
            Ok(None) => None,
            Err(elapsed) => {
                tracing::warn!(timeout = ?idle, "Backend stalled while streaming response");
                Some((Err(BoxError::from(elapsed)), None))
            }
        }
    });
    Body::from_stream(timed)
}
