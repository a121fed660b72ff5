//! Proxy behavior against a live axum server and a mock upstream.

use std::net::SocketAddr;
use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;
use tokio::net::TcpListener;

use docsmith::proxy::{router, ProxyState};

const API_KEY: &str = "secret-key";

async fn spawn_proxy(upstream_url: &str) -> SocketAddr {
    let state = ProxyState::new(upstream_url, API_KEY);
    let app = router(Arc::new(state));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app.into_make_service()).await {
            eprintln!("proxy server error: {err:?}");
        }
    });
    addr
}

#[tokio::test]
async fn preflight_returns_cors_headers_for_any_path() {
    let addr = spawn_proxy("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    let response = client
        .request(reqwest::Method::OPTIONS, format!("http://{addr}/api/ask"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-methods")
            .unwrap(),
        "POST, OPTIONS"
    );
}

#[tokio::test]
async fn unknown_routes_get_a_cors_tagged_not_found() {
    let addr = spawn_proxy("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/api/ask"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn embed_requests_forward_with_the_server_credential() {
    let upstream = MockServer::start_async().await;
    let mock = upstream
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/embeddings")
                .header("authorization", format!("Bearer {API_KEY}"))
                .json_body(json!({ "model": "embed-model", "input": ["hello"] }));
            then.status(201)
                .header("content-type", "application/json")
                .json_body(json!({ "embeddings": [[0.25, 0.75]] }));
        })
        .await;

    let addr = spawn_proxy(&upstream.base_url()).await;
    let client = reqwest::Client::new();

    // The caller's own credential and dev-origin headers must not reach
    // the upstream; the mock above only matches the injected bearer.
    let response = client
        .post(format!("http://{addr}/api/embed"))
        .header("authorization", "Bearer caller-credential")
        .header("referer", "http://localhost:5173/")
        .header("origin", "http://localhost:5173")
        .json(&json!({ "model": "embed-model", "input": ["hello"] }))
        .send()
        .await
        .unwrap();

    mock.assert_async().await;
    // Status passes through unchanged, body verbatim, CORS attached.
    assert_eq!(response.status(), 201);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "embeddings": [[0.25, 0.75]] }));
}

#[tokio::test]
async fn ask_responses_are_relayed_with_sse_headers_forced() {
    let sse_body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";
    let upstream = MockServer::start_async().await;
    upstream
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", format!("Bearer {API_KEY}"));
            then.status(200)
                .header("content-type", "application/octet-stream")
                .header("x-upstream-extra", "kept")
                .body(sse_body);
        })
        .await;

    let addr = spawn_proxy(&upstream.base_url()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/ask"))
        .json(&json!({ "model": "chat", "messages": [], "stream": true }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers().clone();
    assert_eq!(
        headers.get("content-type").unwrap(),
        "text/event-stream; charset=utf-8"
    );
    assert_eq!(headers.get("cache-control").unwrap(), "no-cache, no-transform");
    assert_eq!(headers.get("x-accel-buffering").unwrap(), "no");
    assert_eq!(headers.get("x-upstream-extra").unwrap(), "kept");
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");

    let body = response.text().await.unwrap();
    assert_eq!(body, sse_body);
}

#[tokio::test]
async fn upstream_error_statuses_pass_through_untranslated() {
    let upstream = MockServer::start_async().await;
    upstream
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(401).body("{\"error\":\"bad key\"}");
        })
        .await;

    let addr = spawn_proxy(&upstream.base_url()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/embed"))
        .json(&json!({ "model": "m", "input": [] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    assert_eq!(response.text().await.unwrap(), "{\"error\":\"bad key\"}");
}

#[tokio::test]
async fn unreachable_upstream_surfaces_as_bad_gateway() {
    // Nothing listens on port 1.
    let addr = spawn_proxy("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/ask"))
        .json(&json!({ "model": "m", "messages": [] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn version_suffixed_upstream_bases_are_not_doubled() {
    let upstream = MockServer::start_async().await;
    let mock = upstream
        .mock_async(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200).json_body(json!({ "embeddings": [] }));
        })
        .await;

    let addr = spawn_proxy(&upstream.url("/v1")).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/embed"))
        .json(&json!({ "model": "m", "input": [] }))
        .send()
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status(), 200);
}
