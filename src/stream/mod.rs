//! Client side of the streaming ask pipeline.
//!
//! [`stream_ask`] posts an [`AskOptions`] payload to the proxy's
//! `/api/ask` route, then drives an [`SseDecoder`] over the response byte
//! stream, delivering tokens and exactly one terminal callback.

pub mod decoder;

pub use decoder::{SseDecoder, StreamEvent};

use futures_util::StreamExt;
use thiserror::Error;

use crate::types::AskOptions;

/// Failures surfaced through the error callback.
///
/// Errors never escape the ask call itself; they are funneled through
/// [`StreamHandlers`] so UI code can degrade gracefully.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The ask request was answered with a non-success status.
    #[error("ask request failed with HTTP {status}")]
    UpstreamStatus { status: u16 },
    /// The request or a mid-stream read failed at the transport level.
    #[error("ask transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Callbacks for one streaming ask call.
///
/// `on_token` fires zero or more times in stream order, then exactly one of
/// `on_done` / `on_error` fires. The terminal callbacks are `FnOnce` and the
/// dispatch consumes the handler set, so a second terminal call cannot
/// compile.
pub struct StreamHandlers {
    on_token: Box<dyn FnMut(&str) + Send>,
    on_error: Option<Box<dyn FnOnce(StreamError) + Send>>,
    on_done: Option<Box<dyn FnOnce() + Send>>,
}

impl StreamHandlers {
    /// Creates a handler set with the required token callback.
    pub fn new(on_token: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            on_token: Box::new(on_token),
            on_error: None,
            on_done: None,
        }
    }

    /// Installs the error callback.
    pub fn on_error(mut self, on_error: impl FnOnce(StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }

    /// Installs the clean-completion callback.
    pub fn on_done(mut self, on_done: impl FnOnce() + Send + 'static) -> Self {
        self.on_done = Some(Box::new(on_done));
        self
    }

    fn token(&mut self, text: &str) {
        (self.on_token)(text);
    }

    fn finish_ok(self) {
        if let Some(on_done) = self.on_done {
            on_done();
        }
    }

    fn finish_err(self, err: StreamError) {
        if let Some(on_error) = self.on_error {
            on_error(err);
        }
    }
}

/// Streams assistant tokens for `options` from the proxy at `base_url`.
///
/// The streaming flag is forced on regardless of the payload. A
/// non-success response status produces exactly one `on_error` call and no
/// tokens. When the upstream closes the stream without the `[DONE]`
/// sentinel, completion is still clean and `on_done` fires.
///
/// Cancellation: dropping the returned future aborts the underlying
/// request and releases the connection; no callback fires after the drop.
pub async fn stream_ask(
    client: &reqwest::Client,
    base_url: &str,
    options: &AskOptions,
    mut handlers: StreamHandlers,
) {
    let payload = serde_json::json!({
        "model": options.model,
        "messages": options.messages,
        "stream": true,
    });
    let url = format!("{}/api/ask", base_url.trim_end_matches('/'));

    let response = match client.post(url).json(&payload).send().await {
        Ok(response) => response,
        Err(err) => return handlers.finish_err(err.into()),
    };

    let status = response.status();
    if !status.is_success() {
        return handlers.finish_err(StreamError::UpstreamStatus {
            status: status.as_u16(),
        });
    }

    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();

    while let Some(read) = body.next().await {
        let chunk = match read {
            Ok(chunk) => chunk,
            Err(err) => return handlers.finish_err(err.into()),
        };
        for event in decoder.feed(&chunk) {
            match event {
                StreamEvent::Token(token) => handlers.token(&token),
                StreamEvent::Done => return handlers.finish_ok(),
            }
        }
    }

    // Upstream closed without the sentinel: clean completion.
    decoder.finish();
    handlers.finish_ok()
}
