//! Batched embedding requests against an OpenAI-compatible endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::endpoint::embeddings_endpoint;

/// Failures while embedding a batch of texts.
///
/// There is no retry path: a partial index is worse than no index, so the
/// first failure aborts the whole build.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The provider answered with a non-success HTTP status.
    #[error("embeddings request failed with HTTP {status}")]
    UpstreamStatus { status: u16 },
    /// The response body did not carry the expected vector collection.
    #[error("embeddings response missing expected vector collection")]
    MissingEmbeddings,
    /// The provider returned a different number of vectors than texts sent.
    #[error("embeddings response carried {got} vectors for {expected} inputs")]
    CountMismatch { got: usize, expected: usize },
    /// The request never completed.
    #[error("embeddings transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Source of embedding vectors for ordered batches of plain text.
///
/// Implementations must return exactly one vector per input, in input
/// order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `texts`, returning `texts.len()` vectors in the same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Model name recorded in the index artifact.
    fn model(&self) -> &str;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Accepts both the wrapped shape (`{"embeddings": [[..]]}`) and the OpenAI
/// shape (`{"data": [{"index": n, "embedding": [..]}]}`).
#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    data: Option<Vec<EmbeddingEntry>>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

/// HTTP embedding client carrying the upstream credential.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpEmbeddingClient {
    /// Creates a client for the provider at `base_url`.
    ///
    /// The `/v1` version segment is appended to the base only when missing,
    /// so bases configured with or without it both work.
    pub fn new(base_url: &str, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: embeddings_endpoint(base_url),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Endpoint URL this client posts batches to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|_| EmbeddingError::MissingEmbeddings)?;

        let vectors = match (body.embeddings, body.data) {
            (Some(vectors), _) => vectors,
            (None, Some(mut entries)) => {
                entries.sort_by_key(|entry| entry.index);
                entries.into_iter().map(|entry| entry.embedding).collect()
            }
            (None, None) => return Err(EmbeddingError::MissingEmbeddings),
        };

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                got: vectors.len(),
                expected: texts.len(),
            });
        }

        tracing::debug!(batch = texts.len(), "embedded batch");
        Ok(vectors)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Deterministic in-process provider for tests and offline runs.
///
/// Vectors are derived from a hash of the text, so equal texts embed
/// equally and distinct texts (almost always) differ.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dims: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dims: 8 }
    }

    pub fn with_dims(dims: usize) -> Self {
        Self { dims }
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| mock_vector(text, self.dims))
            .collect())
    }

    fn model(&self) -> &str {
        "mock-embedding"
    }
}

fn mock_vector(text: &str, dims: usize) -> Vec<f32> {
    // FNV-1a seed, then a splitmix-style walk per dimension.
    let mut state = 0xcbf2_9ce4_8422_2325u64;
    for byte in text.bytes() {
        state ^= u64::from(byte);
        state = state.wrapping_mul(0x0000_0100_0000_01b3);
    }

    let mut out = Vec::with_capacity(dims);
    for _ in 0..dims {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
        out.push(unit * 2.0 - 1.0);
    }
    out
}
