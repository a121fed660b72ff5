//! ```text
//! Offline build (once per deploy):
//!
//! Markdown corpus ──► index::IndexBuilder ──► segment::HeadingSegmenter
//!                                  │                    │
//!                                  │          segment::markdown_to_plain
//!                                  ▼
//!                embeddings::EmbeddingProvider (batched)
//!                                  │
//!                                  ▼
//!                     search-index.json artifact
//!
//! Online ask (per user interaction):
//!
//! browser ──► proxy (credential injection, CORS, SSE passthrough) ──► upstream
//!    ▲                                                                   │
//!    └──────────── stream::stream_ask ◄── stream::SseDecoder ◄───────────┘
//! ```
//!
//! The artifact is consumed read-only by the site's query component;
//! nothing here performs similarity search or manages conversations.

pub mod config;
pub mod embeddings;
pub mod endpoint;
pub mod index;
pub mod proxy;
pub mod segment;
pub mod stream;
pub mod types;

pub use config::{ConfigError, Settings};
pub use embeddings::{EmbeddingProvider, HttpEmbeddingClient, MockEmbeddingProvider};
pub use index::{write_artifact, IndexBuilder, IndexError};
pub use segment::{HeadingSegmenter, Segment};
pub use stream::{stream_ask, SseDecoder, StreamError, StreamEvent, StreamHandlers};
pub use types::{AskOptions, DocChunk, Message, SearchIndex};
