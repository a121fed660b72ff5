//! Streaming ask client behavior: callback accounting and fragmentation
//! tolerance.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_stream::stream;
use axum::body::{Body, Bytes};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use httpmock::prelude::*;
use proptest::prelude::*;
use tokio::net::TcpListener;

use docsmith::stream::{stream_ask, SseDecoder, StreamEvent, StreamHandlers};
use docsmith::types::{AskOptions, Message};

/// Records every callback in call order so tests can assert exact
/// sequencing.
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn handlers(&self) -> StreamHandlers {
        let tokens = self.calls.clone();
        let errors = self.calls.clone();
        let done = self.calls.clone();
        StreamHandlers::new(move |token| tokens.lock().unwrap().push(format!("token:{token}")))
            .on_error(move |err| errors.lock().unwrap().push(format!("error:{err}")))
            .on_done(move || done.lock().unwrap().push("done".to_string()))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn ask_options() -> AskOptions {
    AskOptions {
        model: "chat-model".to_string(),
        messages: vec![
            Message::system("Answer from the docs."),
            Message::user("How do I install it?"),
        ],
    }
}

#[tokio::test]
async fn tokens_stream_in_order_then_done_fires_once() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/ask")
                .json_body_partial(r#"{"stream": true, "model": "chat-model"}"#);
            then.status(200)
                .header("content-type", "text/event-stream; charset=utf-8")
                .body(
                    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                     data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                     data: [DONE]\n\n",
                );
        })
        .await;

    let recorder = Recorder::default();
    let client = reqwest::Client::new();
    stream_ask(
        &client,
        &server.base_url(),
        &ask_options(),
        recorder.handlers(),
    )
    .await;

    mock.assert_async().await;
    assert_eq!(recorder.calls(), vec!["token:Hel", "token:lo", "done"]);
}

#[tokio::test]
async fn error_status_fires_on_error_and_nothing_else() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/ask");
            then.status(503).body("busy");
        })
        .await;

    let recorder = Recorder::default();
    let client = reqwest::Client::new();
    stream_ask(
        &client,
        &server.base_url(),
        &ask_options(),
        recorder.handlers(),
    )
    .await;

    assert_eq!(
        recorder.calls(),
        vec!["error:ask request failed with HTTP 503"]
    );
}

#[tokio::test]
async fn stream_end_without_sentinel_is_clean_completion() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/ask");
            then.status(200)
                .body("data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n");
        })
        .await;

    let recorder = Recorder::default();
    let client = reqwest::Client::new();
    stream_ask(
        &client,
        &server.base_url(),
        &ask_options(),
        recorder.handlers(),
    )
    .await;

    assert_eq!(recorder.calls(), vec!["token:partial", "done"]);
}

#[tokio::test]
async fn connection_refused_fires_exactly_one_error() {
    let recorder = Recorder::default();
    let client = reqwest::Client::new();
    stream_ask(
        &client,
        "http://127.0.0.1:1",
        &ask_options(),
        recorder.handlers(),
    )
    .await;

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("error:ask transport failure"));
}

/// Serves one `/api/ask` response body in fixed fragments with small gaps,
/// so the client sees genuine network-boundary cuts.
async fn spawn_fragment_server(fragments: Vec<Vec<u8>>) -> SocketAddr {
    let app = Router::new().route(
        "/api/ask",
        post(move || {
            let fragments = fragments.clone();
            async move {
                let body = stream! {
                    for fragment in fragments {
                        yield Ok::<Bytes, Infallible>(Bytes::from(fragment));
                        tokio::time::sleep(Duration::from_millis(2)).await;
                    }
                };
                Response::builder()
                    .header("content-type", "text/event-stream")
                    .body(Body::from_stream(body))
                    .unwrap()
            }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn network_fragmented_reads_reassemble_tokens() {
    let bytes = RAW_STREAM.as_bytes();
    // Cut mid-frame, mid-line, and inside the two-byte "é" sequence.
    let cuts = [9usize, 41, 47, 90];
    let mut fragments = Vec::new();
    let mut start = 0;
    for cut in cuts {
        fragments.push(bytes[start..cut].to_vec());
        start = cut;
    }
    fragments.push(bytes[start..].to_vec());

    let addr = spawn_fragment_server(fragments).await;
    let recorder = Recorder::default();
    let client = reqwest::Client::new();
    stream_ask(
        &client,
        &format!("http://{addr}"),
        &ask_options(),
        recorder.handlers(),
    )
    .await;

    assert_eq!(
        recorder.calls(),
        vec!["token:Héllo ", "token:wörld", "token:☃", "done"]
    );
}

// Fragmentation invariance: any way of cutting the byte stream into reads
// produces the same events as one contiguous read.

const RAW_STREAM: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Héllo \"}}]}\n\n\
                          data: {\"choices\":[{\"delta\":{\"content\":\"wörld\"}}]}\n\n\
                          data: not json, skipped\n\n\
                          data: {\"choices\":[{\"delta\":{\"content\":\"☃\"}}]}\n\n\
                          data: [DONE]\n\n";

fn reference_events() -> Vec<StreamEvent> {
    let mut decoder = SseDecoder::new();
    let mut events = decoder.feed(RAW_STREAM.as_bytes());
    events.extend(decoder.finish());
    events
}

proptest! {
    #[test]
    fn fragmentation_never_changes_the_event_sequence(
        mut cuts in proptest::collection::vec(0..RAW_STREAM.len(), 0..12)
    ) {
        cuts.sort_unstable();
        let bytes = RAW_STREAM.as_bytes();

        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        let mut start = 0;
        for cut in cuts.into_iter().chain(std::iter::once(bytes.len())) {
            events.extend(decoder.feed(&bytes[start..cut]));
            start = cut;
        }
        events.extend(decoder.finish());

        prop_assert_eq!(events, reference_events());
    }
}

#[test]
fn reference_stream_decodes_as_expected() {
    assert_eq!(
        reference_events(),
        vec![
            StreamEvent::Token("Héllo ".into()),
            StreamEvent::Token("wörld".into()),
            StreamEvent::Token("☃".into()),
            StreamEvent::Done,
        ]
    );
}
