//! Core data types shared across the indexing and streaming pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One indexable unit of documentation text, tied to a page and a heading
/// anchor.
///
/// Chunks are produced by the index builder and persisted inside
/// [`SearchIndex`]. The serialized field names follow the published artifact
/// contract (`pagePath`, not `page_path`), since the artifact is consumed by
/// a JavaScript client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocChunk {
    /// Stable identifier, `{pagePath}#{anchor}`, unique within the index.
    pub id: String,
    /// Site-relative page path without the source extension.
    pub page_path: String,
    /// Deep link to the rendered page: `{pagePath}.html#{anchor}`.
    pub url: String,
    /// Page-level title (first level-1 heading, or a filename fallback).
    pub title: String,
    /// Nearest enclosing heading; equals `title` for pre-heading content.
    pub heading: String,
    /// URL-fragment slug for the heading, unique per page.
    pub anchor: String,
    /// Plain-text, whitespace-normalized content.
    pub content: String,
    /// Embedding vector; its length equals the index-wide `dims`.
    pub embedding: Vec<f32>,
}

/// The persisted search index artifact.
///
/// Built fresh on every run and written in one shot after all chunks are
/// embedded and validated; there is no incremental update path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndex {
    /// Site-wide index schema tag.
    pub model: String,
    /// Name of the embedding model used, for cache invalidation.
    pub embedding_model: String,
    /// Embedding width; zero only when the index holds no chunks.
    pub dims: usize,
    /// Build timestamp.
    pub built_at: DateTime<Utc>,
    /// Chunks in corpus discovery order. The order carries no semantic
    /// meaning.
    pub chunks: Vec<DocChunk>,
}

/// A chat message with a role and text content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Sender role; use the constants on [`Message`] for standard values.
    pub role: String,
    /// Text content of the message.
    pub content: String,
}

impl Message {
    /// System prompt message role.
    pub const SYSTEM: &'static str = "system";
    /// User input message role.
    pub const USER: &'static str = "user";
    /// Assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";

    /// Creates a message with the given role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }
}

/// Payload for a streaming ask request.
///
/// The streaming flag is not part of the options; the ask client forces it
/// on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskOptions {
    /// Chat model to answer with.
    pub model: String,
    /// Conversation supplied by the caller, in order.
    pub messages: Vec<Message>,
}
