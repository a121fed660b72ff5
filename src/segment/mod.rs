//! Heading-scoped segmentation of Markdown documents.
//!
//! [`HeadingSegmenter`] walks a document line by line and yields one segment
//! per heading scope: the text between a heading and the next one, tagged
//! with the enclosing heading and a per-document unique anchor slug. Content
//! before the first heading is attributed to the document title. The walk is
//! lazy, finite, and single-pass; re-segmenting requires a fresh segmenter.

pub mod plain;
pub mod slug;

pub use plain::markdown_to_plain;
pub use slug::Slugger;

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());

/// One heading-scoped slice of a document.
///
/// `content` is the raw Markdown between headings; callers reduce it with
/// [`markdown_to_plain`] and apply their own minimum-length filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Nearest enclosing heading text; the document title for content that
    /// precedes any heading.
    pub heading: String,
    /// Raw Markdown lines between this heading and the next.
    pub content: String,
    /// URL-fragment slug for the heading, unique within the document.
    pub anchor: String,
    /// Document title (first level-1 heading, else the supplied default).
    pub title: String,
}

/// Lazy iterator over a document's heading-scoped segments.
///
/// Heading lines inside fenced code blocks (``` or ~~~) are treated as
/// content, not as section boundaries.
///
/// # Examples
/// ```
/// use docsmith::segment::HeadingSegmenter;
///
/// let doc = "# Title\nIntro text.\n## Sub\nBody text here.";
/// let segments: Vec<_> = HeadingSegmenter::new(doc, "Page").collect();
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[0].heading, "Title");
/// assert_eq!(segments[0].anchor, "title");
/// assert_eq!(segments[1].heading, "Sub");
/// assert_eq!(segments[1].content, "Body text here.");
/// ```
pub struct HeadingSegmenter<'a> {
    lines: std::str::Lines<'a>,
    slugger: Slugger,
    title: String,
    current_heading: String,
    /// Resolved lazily so a document that opens with its own title heading
    /// gets the unsuffixed slug for it.
    current_anchor: Option<String>,
    buffer: Vec<&'a str>,
    fence: Option<&'static str>,
}

impl<'a> HeadingSegmenter<'a> {
    /// Creates a segmenter over `markdown`, using `default_title` when the
    /// document has no level-1 heading.
    pub fn new(markdown: &'a str, default_title: &str) -> Self {
        let title = extract_title(markdown).unwrap_or_else(|| default_title.to_string());
        Self {
            lines: markdown.lines(),
            slugger: Slugger::new(),
            current_heading: title.clone(),
            title,
            current_anchor: None,
            buffer: Vec::new(),
            fence: None,
        }
    }

    fn resolve_anchor(&mut self) -> String {
        match &self.current_anchor {
            Some(anchor) => anchor.clone(),
            None => {
                let anchor = self.slugger.slug(&self.current_heading);
                self.current_anchor = Some(anchor.clone());
                anchor
            }
        }
    }

    fn flush(&mut self) -> Segment {
        let anchor = self.resolve_anchor();
        Segment {
            heading: self.current_heading.clone(),
            content: std::mem::take(&mut self.buffer).join("\n"),
            anchor,
            title: self.title.clone(),
        }
    }
}

impl<'a> Iterator for HeadingSegmenter<'a> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        while let Some(line) = self.lines.next() {
            if let Some(open) = self.fence {
                self.buffer.push(line);
                if fence_marker(line) == Some(open) {
                    self.fence = None;
                }
                continue;
            }

            if let Some(marker) = fence_marker(line) {
                self.fence = Some(marker);
                self.buffer.push(line);
                continue;
            }

            if let Some(caps) = HEADING.captures(line) {
                let heading = caps[2].trim().to_string();
                let pending = if self.buffer.is_empty() {
                    None
                } else {
                    Some(self.flush())
                };
                self.current_anchor = Some(self.slugger.slug(&heading));
                self.current_heading = heading;
                if pending.is_some() {
                    return pending;
                }
                continue;
            }

            self.buffer.push(line);
        }

        if self.buffer.is_empty() {
            None
        } else {
            Some(self.flush())
        }
    }
}

/// First level-1 heading in the document, skipping fenced code blocks.
fn extract_title(markdown: &str) -> Option<String> {
    let mut fence: Option<&'static str> = None;
    for line in markdown.lines() {
        if let Some(open) = fence {
            if fence_marker(line) == Some(open) {
                fence = None;
            }
            continue;
        }
        if let Some(marker) = fence_marker(line) {
            fence = Some(marker);
            continue;
        }
        if let Some(caps) = HEADING.captures(line) {
            if caps[1].len() == 1 {
                return Some(caps[2].trim().to_string());
            }
        }
    }
    None
}

fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}
