#![no_main]
use docsmith::stream::{SseDecoder, StreamEvent};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes at arbitrary split points must never panic, and the
    // terminal event must never be followed by another event.
    let mid = data.len() / 2;
    let mut decoder = SseDecoder::new();
    let mut events = decoder.feed(&data[..mid]);
    events.extend(decoder.feed(&data[mid..]));
    events.extend(decoder.finish());

    if let Some(pos) = events.iter().position(|e| *e == StreamEvent::Done) {
        assert_eq!(pos, events.len() - 1);
    }
    assert!(decoder.feed(b"data: [DONE]\n\n").is_empty());
    assert!(decoder.finish().is_empty());
});
