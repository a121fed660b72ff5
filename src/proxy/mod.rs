//! Credential-hiding streaming proxy in front of the upstream provider.
//!
//! The proxy is stateless per request: it reconstructs the upstream URL,
//! injects the server-held bearer credential, relays the body verbatim in
//! both directions, and passes the upstream status through unchanged. It
//! never interprets payloads and never retries. Upstream-bound requests are
//! built from scratch, so caller headers — `Authorization` in particular,
//! but also `Referer`/`Origin`, which can trip upstream edge firewalls when
//! they carry a development origin — are never forwarded.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;

use crate::endpoint::{chat_completions_endpoint, embeddings_endpoint};

/// Shared, read-only proxy configuration.
pub struct ProxyState {
    client: reqwest::Client,
    upstream_url: String,
    api_key: String,
}

impl ProxyState {
    pub fn new(upstream_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upstream_url: upstream_url.into(),
            api_key: api_key.into(),
        }
    }
}

/// Explicit routing table, so the header policy per route stays auditable
/// in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// `OPTIONS *`: CORS preflight.
    Preflight,
    /// `POST /api/embed`: forward to the embeddings endpoint.
    Embed,
    /// `POST /api/ask`: forward to chat completions, stream SSE back.
    Ask,
    NotFound,
}

impl Route {
    fn resolve(method: &Method, path: &str) -> Self {
        if *method == Method::OPTIONS {
            return Route::Preflight;
        }
        match (method, path) {
            (&Method::POST, "/api/embed") => Route::Embed,
            (&Method::POST, "/api/ask") => Route::Ask,
            _ => Route::NotFound,
        }
    }
}

/// Builds the proxy router around shared state.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

/// Binds `addr` and serves the proxy until the task is dropped.
pub async fn serve(addr: SocketAddr, state: ProxyState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "proxy listening");
    axum::serve(listener, router(Arc::new(state)).into_make_service()).await
}

async fn dispatch(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let route = Route::resolve(&method, uri.path());
    tracing::debug!(method = %method, path = uri.path(), route = ?route, "dispatch");
    match route {
        Route::Preflight => with_headers(StatusCode::NO_CONTENT, cors_headers(), Body::empty()),
        Route::Embed | Route::Ask => forward(&state, route, body).await,
        Route::NotFound => with_headers(
            StatusCode::NOT_FOUND,
            cors_headers(),
            Body::from("Not found"),
        ),
    }
}

async fn forward(state: &ProxyState, route: Route, body: Bytes) -> Response {
    let endpoint = match route {
        Route::Ask => chat_completions_endpoint(&state.upstream_url),
        _ => embeddings_endpoint(&state.upstream_url),
    };

    let upstream = state
        .client
        .post(&endpoint)
        .bearer_auth(&state.api_key)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(endpoint = %endpoint, error = %err, "upstream unreachable");
            return with_headers(
                StatusCode::BAD_GATEWAY,
                cors_headers(),
                Body::from("Upstream unreachable"),
            );
        }
    };

    let status = upstream.status();
    let mut headers = passthrough_headers(upstream.headers());
    if route == Route::Ask {
        overlay(&mut headers, sse_headers());
    }
    overlay(&mut headers, cors_headers());

    with_headers(status, headers, Body::from_stream(upstream.bytes_stream()))
}

fn with_headers(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Upstream response headers minus message-framing ones, which the relayed
/// stream re-derives.
fn passthrough_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    for name in [
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::CONNECTION,
    ] {
        headers.remove(name);
    }
    headers
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers
}

/// Headers forced onto ask responses so intermediaries do not buffer the
/// event stream.
fn sse_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream; charset=utf-8"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    headers
}

/// Copies `extra` over `base`; `extra` wins on conflicts.
fn overlay(base: &mut HeaderMap, extra: HeaderMap) {
    for (name, value) in extra.iter() {
        base.insert(name.clone(), value.clone());
    }
}
