#![no_main]
use docsmith::segment::{markdown_to_plain, HeadingSegmenter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Segmentation and reduction must never panic, and anchors stay unique
    // within a single document.
    let mut anchors = std::collections::HashSet::new();
    for segment in HeadingSegmenter::new(data, "page") {
        assert!(anchors.insert(segment.anchor.clone()));
        let _ = markdown_to_plain(&segment.content);
    }
});
