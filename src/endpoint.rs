//! Upstream endpoint URL construction.
//!
//! The embedding client and the proxy both talk to an OpenAI-compatible
//! provider whose resources live under a `/v1` path segment. Operators
//! configure the base URL with or without that segment, so construction has
//! to be idempotent: appending the version segment to a base that already
//! carries it must not duplicate it.

/// Version path segment expected by the upstream provider.
const VERSION_SEGMENT: &str = "/v1";

/// Joins an upstream base URL with a versioned resource path.
///
/// Trailing slashes on the base are trimmed first. The `/v1` segment is
/// inserted only when the base does not already end with it.
///
/// # Examples
/// ```
/// use docsmith::endpoint::versioned_endpoint;
///
/// assert_eq!(
///     versioned_endpoint("https://api.example.com", "embeddings"),
///     "https://api.example.com/v1/embeddings",
/// );
/// assert_eq!(
///     versioned_endpoint("https://api.example.com/v1/", "embeddings"),
///     "https://api.example.com/v1/embeddings",
/// );
/// ```
pub fn versioned_endpoint(base: &str, resource: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(VERSION_SEGMENT) {
        format!("{base}/{resource}")
    } else {
        format!("{base}{VERSION_SEGMENT}/{resource}")
    }
}

/// Endpoint for batch embedding requests.
pub fn embeddings_endpoint(base: &str) -> String {
    versioned_endpoint(base, "embeddings")
}

/// Endpoint for (streaming) chat completion requests.
pub fn chat_completions_endpoint(base: &str) -> String {
    versioned_endpoint(base, "chat/completions")
}
