//! Environment-driven settings for the build and proxy binaries.

use thiserror::Error;

/// Default embedding model when `DOCSMITH_EMBED_MODEL` is unset.
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";
/// Default number of texts per embedding request.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 64;
/// Default minimum plain-text length for an indexable segment.
pub const DEFAULT_MIN_SEGMENT_CHARS: usize = 10;
/// Default upstream base when `DOCSMITH_UPSTREAM_URL` is unset.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.example.com";

/// Configuration failures detected before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The upstream credential is missing or empty.
    #[error("missing DOCSMITH_API_KEY")]
    MissingApiKey,
    /// A numeric variable could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    /// The upstream base URL is not a parseable absolute URL.
    #[error("invalid DOCSMITH_UPSTREAM_URL {value:?}: {source}")]
    InvalidUpstreamUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Process-wide configuration, read once at startup and never mutated.
///
/// The credential is required; everything else has a default. A missing or
/// empty `DOCSMITH_API_KEY` fails here, before any network call is made.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Upstream provider base URL, with or without a trailing `/v1`.
    pub upstream_url: String,
    /// Secret bearer credential for the upstream provider.
    pub api_key: String,
    /// Embedding model name sent with every batch.
    pub embed_model: String,
    /// Number of texts per embedding request.
    pub embed_batch_size: usize,
    /// Minimum plain-text length for an indexable segment.
    pub min_segment_chars: usize,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_var("DOCSMITH_API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let upstream_url = env_var("DOCSMITH_UPSTREAM_URL")
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());
        url::Url::parse(&upstream_url).map_err(|source| ConfigError::InvalidUpstreamUrl {
            value: upstream_url.clone(),
            source,
        })?;
        Ok(Self {
            upstream_url,
            api_key,
            embed_model: env_var("DOCSMITH_EMBED_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
            embed_batch_size: env_usize("DOCSMITH_EMBED_BATCH_SIZE", DEFAULT_EMBED_BATCH_SIZE)?,
            min_segment_chars: env_usize("DOCSMITH_MIN_SEGMENT_CHARS", DEFAULT_MIN_SEGMENT_CHARS)?,
        })
    }
}

/// Returns the variable's value, treating empty/whitespace values as unset.
fn env_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn env_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env_var(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: name,
            value,
        }),
        None => Ok(default),
    }
}
