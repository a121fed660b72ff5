//! Markdown-to-plain-text reduction.
//!
//! Strips formatting markup while keeping the human-readable text: link and
//! image labels survive, URLs and markers do not. The result is collapsed to
//! single spaces and trimmed, which is the normalization the index stores
//! and embeds.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*(```|~~~).*$").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]*)`").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").unwrap());
static BLOCKQUOTE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*>[ \t]?").unwrap());
static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+\.)[ \t]+").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap());

/// Reduces Markdown to whitespace-normalized plain text.
///
/// # Examples
/// ```
/// use docsmith::segment::markdown_to_plain;
///
/// let plain = markdown_to_plain("See the **[user guide](/guide)** for\ndetails.");
/// assert_eq!(plain, "See the user guide for details.");
/// ```
pub fn markdown_to_plain(markdown: &str) -> String {
    let text = FENCE_LINE.replace_all(markdown, "");
    let text = IMAGE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = BOLD.replace_all(&text, "$1$2");
    let text = ITALIC.replace_all(&text, "$1");
    let text = HEADING_MARKER.replace_all(&text, "");
    let text = BLOCKQUOTE_MARKER.replace_all(&text, "");
    let text = LIST_MARKER.replace_all(&text, "");
    let text = HTML_TAG.replace_all(&text, " ");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
