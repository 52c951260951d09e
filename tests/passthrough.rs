//! Streaming passthrough on `/asr`.

mod common;

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::routing::post;
use axum::Router;
use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tower::ServiceExt;

use common::{
    body_bytes, body_json, closed_port, config_for, gateway, start_backend, start_mock_backend,
    API_KEY,
};
use whisper_gateway::forward::Upstream;

const TRANSCRIPT: &str = r#"{"text":"hello world","segments":[]}"#;

fn authorized(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY)
}

#[tokio::test]
async fn test_passthrough_preserves_query_headers_and_body() {
    let backend = start_mock_backend(StatusCode::OK, TRANSCRIPT, StatusCode::OK).await;

    let request = authorized("POST", "/asr?task=transcribe&language=da&output=json")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=abc")
        .header("x-trace-tag", "alpha")
        .body(Body::from("raw-multipart-payload"))
        .unwrap();
    let response = gateway(backend.addr).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-backend").unwrap(), "whisper");
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(&body_bytes(response).await[..], TRANSCRIPT.as_bytes());

    let seen = backend.last();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.uri.path(), "/asr");
    assert_eq!(
        seen.uri.query(),
        Some("task=transcribe&language=da&output=json")
    );
    assert_eq!(
        seen.headers.get(header::CONTENT_TYPE).unwrap(),
        "multipart/form-data; boundary=abc"
    );
    assert_eq!(seen.headers.get("x-trace-tag").unwrap(), "alpha");
    assert_eq!(&seen.body[..], b"raw-multipart-payload");
}

#[tokio::test]
async fn test_passthrough_without_query_sends_bare_path() {
    let backend = start_mock_backend(StatusCode::OK, TRANSCRIPT, StatusCode::OK).await;

    let request = authorized("POST", "/asr").body(Body::empty()).unwrap();
    let response = gateway(backend.addr).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.last().uri.query(), None);
}

#[tokio::test]
async fn test_passthrough_relays_backend_error_status() {
    let backend = start_mock_backend(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"detail":"bad audio"}"#,
        StatusCode::OK,
    )
    .await;

    let request = authorized("POST", "/asr").body(Body::from("x")).unwrap();
    let response = gateway(backend.addr).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "bad audio");
}

#[tokio::test]
async fn test_passthrough_unreachable_backend_is_server_error() {
    let addr = closed_port().await;

    let request = authorized("POST", "/asr").body(Body::from("x")).unwrap();
    let response = gateway(addr).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("backend"));
}

#[tokio::test]
async fn test_passthrough_times_out_slow_backend() {
    let router = Router::new().route(
        "/asr",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "too late"
        }),
    );
    let addr = start_backend(router).await;

    let mut config = config_for(addr);
    config.backend.request_timeout_secs = 1;
    let upstream = Upstream::new(&config.backend).unwrap();

    let result = upstream
        .forward(
            Method::POST,
            None,
            &HeaderMap::new(),
            futures_util::stream::iter(vec![Ok::<_, Infallible>(Bytes::from_static(b"x"))]),
        )
        .await;

    let error = result.unwrap_err();
    assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_forward_accepts_in_memory_chunk_stream() {
    let backend = start_mock_backend(StatusCode::OK, TRANSCRIPT, StatusCode::OK).await;
    let upstream = Upstream::new(&config_for(backend.addr).backend).unwrap();

    let chunks = vec![
        Ok::<_, Infallible>(Bytes::from_static(b"first-")),
        Ok(Bytes::from_static(b"second-")),
        Ok(Bytes::from_static(b"third")),
    ];
    let response = upstream
        .forward(
            Method::POST,
            Some("output=json"),
            &HeaderMap::new(),
            futures_util::stream::iter(chunks),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let seen = backend.last();
    assert_eq!(&seen.body[..], b"first-second-third");
    assert_eq!(seen.uri.query(), Some("output=json"));
}

/// The backend must observe the first chunk while the client is still
/// holding back the rest of the upload.
#[tokio::test]
async fn test_upload_reaches_backend_before_client_finishes() {
    let (first_tx, first_rx) = oneshot::channel::<()>();
    let first_tx = Arc::new(Mutex::new(Some(first_tx)));

    let router = Router::new().route(
        "/asr",
        post(move |body: Body| {
            let first_tx = first_tx.clone();
            async move {
                let mut stream = body.into_data_stream();
                let mut total = 0usize;
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.unwrap();
                    if !chunk.is_empty() {
                        if let Some(tx) = first_tx.lock().unwrap().take() {
                            let _ = tx.send(());
                        }
                    }
                    total += chunk.len();
                }
                total.to_string()
            }
        }),
    );
    let addr = start_backend(router).await;

    let (tx, rx) = mpsc::channel::<Bytes>(1);
    let upload = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });
    let request = authorized("POST", "/asr")
        .body(Body::from_stream(upload))
        .unwrap();

    let app = gateway(addr);
    let call = tokio::spawn(async move { app.oneshot(request).await.unwrap() });

    let chunk = Bytes::from(vec![b'a'; 64 * 1024]);
    tx.send(chunk.clone()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), first_rx)
        .await
        .expect("backend saw nothing before the upload completed")
        .unwrap();

    for _ in 0..3 {
        tx.send(chunk.clone()).await.unwrap();
    }
    drop(tx);

    let response = call.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        &body_bytes(response).await[..],
        (4 * 64 * 1024).to_string().as_bytes()
    );
}

/// The caller must receive the first chunk of the result while the backend
/// is still producing the rest.
#[tokio::test]
async fn test_response_reaches_client_before_backend_finishes() {
    let (result_tx, result_rx) = mpsc::channel::<Bytes>(1);
    let result_rx = Arc::new(Mutex::new(Some(result_rx)));

    let router = Router::new().route(
        "/asr",
        post(move || {
            let result_rx = result_rx.clone();
            async move {
                let rx = result_rx.lock().unwrap().take().unwrap();
                let stream = futures_util::stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
                });
                Body::from_stream(stream)
            }
        }),
    );
    let addr = start_backend(router).await;

    let request = authorized("POST", "/asr").body(Body::empty()).unwrap();
    let response = gateway(addr).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body().into_data_stream();
    result_tx
        .send(Bytes::from_static(b"{\"text\":"))
        .await
        .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("no bytes relayed while backend was still streaming")
        .unwrap()
        .unwrap();
    assert_eq!(&first[..], b"{\"text\":");

    result_tx
        .send(Bytes::from_static(b"\"done\"}"))
        .await
        .unwrap();
    drop(result_tx);

    let mut rest = Vec::new();
    while let Some(chunk) = body.next().await {
        rest.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(&rest[..], b"\"done\"}");
}

#[tokio::test]
async fn test_upload_stream_error_does_not_hang_gateway() {
    let backend = start_mock_backend(StatusCode::OK, TRANSCRIPT, StatusCode::OK).await;

    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"partial")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
    ];
    let request = authorized("POST", "/asr")
        .body(Body::from_stream(futures_util::stream::iter(chunks)))
        .unwrap();

    let response = tokio::time::timeout(
        Duration::from_secs(10),
        gateway(backend.addr).oneshot(request),
    )
    .await
    .expect("gateway hung on a broken upload")
    .unwrap();

    assert!(
        response.status() == StatusCode::INTERNAL_SERVER_ERROR
            || response.status() == StatusCode::OK
    );
}

#[tokio::test]
async fn test_passthrough_query_is_not_reencoded() {
    let backend = start_mock_backend(StatusCode::OK, TRANSCRIPT, StatusCode::OK).await;

    let request = authorized("POST", "/asr?initial_prompt=it's&x=a|b&output=json")
        .body(Body::from("x"))
        .unwrap();
    let response = gateway(backend.addr).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        backend.last().uri.query(),
        Some("initial_prompt=it's&x=a|b&output=json")
    );
}

/// A backend that sends headers and a first chunk, then goes silent.
#[tokio::test]
async fn test_stalled_response_body_is_cut_off() {
    let router = Router::new().route(
        "/asr",
        post(|| async {
            let stream = futures_util::stream::once(async {
                Ok::<_, Infallible>(Bytes::from_static(b"{\"text\":"))
            })
            .chain(futures_util::stream::pending());
            Body::from_stream(stream)
        }),
    );
    let addr = start_backend(router).await;

    let mut config = config_for(addr);
    config.backend.request_timeout_secs = 1;
    let app = whisper_gateway::HttpServer::new(config).unwrap().router();

    let request = authorized("POST", "/asr").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    assert_eq!(&first[..], b"{\"text\":");

    let next = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("relayed body hung after the backend stalled");
    assert!(matches!(next, Some(Err(_))));
}
