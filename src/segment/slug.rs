//! GitHub-style heading slugs with per-document collision tracking.

use std::collections::HashMap;

/// Stateful slug generator scoped to one document.
///
/// Repeated heading text within the same document gets a numeric suffix so
/// every anchor stays unique per page. The collision map is owned by the
/// caller's segmentation pass and thrown away with it; slugs are
/// deterministic for a given sequence of headings.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces the anchor slug for `text`, suffixing on collision.
    ///
    /// # Examples
    /// ```
    /// use docsmith::segment::Slugger;
    ///
    /// let mut slugger = Slugger::new();
    /// assert_eq!(slugger.slug("Getting Started"), "getting-started");
    /// assert_eq!(slugger.slug("Getting Started"), "getting-started-1");
    /// assert_eq!(slugger.slug("Getting Started"), "getting-started-2");
    /// ```
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        if !self.seen.contains_key(&base) {
            self.seen.insert(base.clone(), 0);
            return base;
        }

        let mut n = self.seen[&base] + 1;
        let candidate = loop {
            let candidate = format!("{base}-{n}");
            if !self.seen.contains_key(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.seen.insert(base, n);
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}

/// Lowercases, keeps alphanumerics, maps whitespace to hyphens, and drops
/// the rest.
fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            out.push('-');
        }
    }
    out
}
