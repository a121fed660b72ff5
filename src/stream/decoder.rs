//! Incremental SSE frame reassembly.
//!
//! Network reads deliver the event stream at arbitrary boundaries: mid
//! frame, mid line, even mid UTF-8 sequence. [`SseDecoder`] owns the
//! residual state between reads and turns raw bytes into an ordered list of
//! [`StreamEvent`]s, so the surrounding read loop stays a plain
//! `while let` over chunks.

/// One decoded occurrence in the answer stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental piece of assistant text, in stream order.
    Token(String),
    /// Terminal marker; emitted at most once per stream.
    Done,
}

/// Streaming SSE parser with two pieces of state: the residual text buffer
/// and the terminated flag (plus up to three carried bytes of an
/// incomplete UTF-8 sequence).
///
/// Within a complete frame only `data:` lines matter. The literal `[DONE]`
/// sentinel terminates the stream; any other payload is parsed as JSON and
/// non-JSON payloads are ignored, not fatal. After [`StreamEvent::Done`]
/// has been produced, both `feed` and `finish` return nothing.
///
/// # Examples
/// ```
/// use docsmith::stream::{SseDecoder, StreamEvent};
///
/// let mut decoder = SseDecoder::new();
/// let events = decoder.feed(b"data: [DONE]\n\n");
/// assert_eq!(events, vec![StreamEvent::Done]);
/// assert!(decoder.feed(b"data: ignored\n\n").is_empty());
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    partial_utf8: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the terminal event has been produced.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consumes one network read's worth of bytes and returns the events
    /// completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }

        let mut data = std::mem::take(&mut self.partial_utf8);
        data.extend_from_slice(bytes);
        let carry = utf8_carry_len(&data);
        let split = data.len() - carry;
        self.buffer
            .push_str(&String::from_utf8_lossy(&data[..split]));
        self.partial_utf8 = data[split..].to_vec();

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..pos + 2).collect();
            self.process_frame(frame.trim_end_matches('\n'), &mut events);
            if self.done {
                // Anything after the sentinel is discarded.
                self.buffer.clear();
                self.partial_utf8.clear();
                break;
            }
        }
        events
    }

    /// Signals end of input. Emits the terminal event when the stream
    /// closed without a sentinel; an incomplete trailing frame is
    /// discarded.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }
        self.done = true;
        self.buffer.clear();
        self.partial_utf8.clear();
        vec![StreamEvent::Done]
    }

    fn process_frame(&mut self, frame: &str, events: &mut Vec<StreamEvent>) {
        for line in frame.lines() {
            let Some(rest) = line.strip_prefix("data:") else {
                continue;
            };
            let data = rest.trim();
            if data == "[DONE]" {
                self.done = true;
                events.push(StreamEvent::Done);
                return;
            }
            let Ok(value) = serde_json::from_str::<serde_json::Value>(data) else {
                continue;
            };
            if let Some(token) = value
                .pointer("/choices/0/delta/content")
                .and_then(|content| content.as_str())
            {
                if !token.is_empty() {
                    events.push(StreamEvent::Token(token.to_string()));
                }
            }
        }
    }
}

/// Length of an incomplete UTF-8 sequence at the end of `data`, at most 3.
///
/// Invalid (as opposed to incomplete) bytes are left in place for lossy
/// decoding to replace.
fn utf8_carry_len(data: &[u8]) -> usize {
    let len = data.len();
    for back in 1..=len.min(3) {
        let byte = data[len - back];
        if byte & 0xC0 != 0x80 {
            let width = match byte {
                0x00..=0x7F => 1,
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                _ => 1,
            };
            return if width > back { back } else { 0 };
        }
    }
    0
}
