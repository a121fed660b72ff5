//! Corpus discovery and search index construction.
//!
//! [`IndexBuilder`] drives the whole offline pipeline: walk the Markdown
//! corpus, segment every page by heading, reduce segments to plain text,
//! embed them in fixed-size batches, and materialize the artifact. The run
//! is all-or-nothing; nothing is written unless every stage validates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::{DEFAULT_EMBED_BATCH_SIZE, DEFAULT_MIN_SEGMENT_CHARS};
use crate::embeddings::{EmbeddingError, EmbeddingProvider};
use crate::segment::{markdown_to_plain, HeadingSegmenter};
use crate::types::{DocChunk, SearchIndex};

/// Schema tag stamped into every artifact.
pub const INDEX_SCHEMA_TAG: &str = "docs-agent";
/// File name of the published artifact.
pub const ARTIFACT_FILE_NAME: &str = "search-index.json";

/// Directories never treated as corpus content. Hidden directories
/// (`.vitepress`, `.git`, ...) are skipped as well.
const EXCLUDED_DIRS: &[&str] = &["node_modules", "public", "dist", "target"];

/// Failures that abort an index build.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error("corpus walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// Total vectors differ from total segments. Never truncated or padded;
    /// a corrupted index is strictly worse than a stale one.
    #[error("embedding count mismatch: got {got}, expected {expected}")]
    CountMismatch { got: usize, expected: usize },
    #[error("failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A segment waiting for its embedding, in corpus discovery order.
struct PendingChunk {
    page_path: String,
    title: String,
    heading: String,
    anchor: String,
    content: String,
}

/// Builds a [`SearchIndex`] from a Markdown corpus.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use docsmith::embeddings::MockEmbeddingProvider;
/// use docsmith::index::IndexBuilder;
///
/// # async fn run() -> Result<(), docsmith::index::IndexError> {
/// let builder = IndexBuilder::new(Arc::new(MockEmbeddingProvider::new()));
/// let index = builder.build("docs".as_ref()).await?;
/// docsmith::index::write_artifact(&index, "public/search-index.json".as_ref()).await?;
/// # Ok(())
/// # }
/// ```
pub struct IndexBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    min_segment_chars: usize,
}

impl IndexBuilder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
            min_segment_chars: DEFAULT_MIN_SEGMENT_CHARS,
        }
    }

    /// Overrides the number of texts sent per embedding request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Overrides the minimum plain-text length for an indexable segment.
    pub fn with_min_segment_chars(mut self, min_segment_chars: usize) -> Self {
        self.min_segment_chars = min_segment_chars;
        self
    }

    /// Runs the full build. Returns the validated in-memory index; writing
    /// it is the caller's final step via [`write_artifact`].
    pub async fn build(&self, docs_dir: &Path) -> Result<SearchIndex, IndexError> {
        let files = discover(docs_dir)?;
        tracing::info!(files = files.len(), root = %docs_dir.display(), "discovered corpus");

        let mut pending: Vec<PendingChunk> = Vec::new();
        for path in &files {
            let raw = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| IndexError::Io {
                    path: path.clone(),
                    source,
                })?;
            let content = strip_front_matter(&raw);
            let page_path = page_path(docs_dir, path);
            let default_title = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| page_path.trim_start_matches('/').to_string());

            for seg in HeadingSegmenter::new(content, &default_title) {
                let plain = markdown_to_plain(&seg.content);
                if plain.chars().count() < self.min_segment_chars {
                    continue;
                }
                pending.push(PendingChunk {
                    page_path: page_path.clone(),
                    title: seg.title,
                    heading: seg.heading,
                    anchor: seg.anchor,
                    content: plain,
                });
            }
        }
        tracing::info!(segments = pending.len(), "segmented corpus");

        let texts: Vec<String> = pending.iter().map(|chunk| chunk.content.clone()).collect();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.provider.embed_batch(batch).await?);
            tracing::debug!(embedded = vectors.len(), total = texts.len(), "batch complete");
        }

        if vectors.len() != texts.len() {
            return Err(IndexError::CountMismatch {
                got: vectors.len(),
                expected: texts.len(),
            });
        }
        let dims = vectors.first().map(Vec::len).unwrap_or(0);

        let chunks = pending
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| DocChunk {
                id: format!("{}#{}", chunk.page_path, chunk.anchor),
                url: format!("{}.html#{}", chunk.page_path, chunk.anchor),
                page_path: chunk.page_path,
                title: chunk.title,
                heading: chunk.heading,
                anchor: chunk.anchor,
                content: chunk.content,
                embedding,
            })
            .collect();

        Ok(SearchIndex {
            model: INDEX_SCHEMA_TAG.to_string(),
            embedding_model: self.provider.model().to_string(),
            dims,
            built_at: Utc::now(),
            chunks,
        })
    }
}

/// Serializes the index and replaces the artifact at `out_file`, creating
/// parent directories as needed.
pub async fn write_artifact(index: &SearchIndex, out_file: &Path) -> Result<(), IndexError> {
    let json = serde_json::to_vec(index)?;
    if let Some(parent) = out_file.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| IndexError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
    }
    tokio::fs::write(out_file, json)
        .await
        .map_err(|source| IndexError::Io {
            path: out_file.to_path_buf(),
            source,
        })?;
    tracing::info!(
        chunks = index.chunks.len(),
        dims = index.dims,
        path = %out_file.display(),
        "wrote search index"
    );
    Ok(())
}

/// All Markdown files under `root` in deterministic (sorted) order,
/// excluding build output and tooling directories.
fn discover(root: &Path) -> Result<Vec<PathBuf>, IndexError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !name.starts_with('.') && !EXCLUDED_DIRS.contains(&name.as_ref())
        });

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "md")
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Site-relative page path: `/`-separated, rooted, without the `.md`
/// extension.
fn page_path(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    let joined = rel
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let trimmed = joined.strip_suffix(".md").unwrap_or(&joined);
    format!("/{trimmed}")
}

/// Drops a leading YAML front-matter block (`---` ... `---`), if present.
fn strip_front_matter(raw: &str) -> &str {
    let mut lines = raw.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return raw;
    };
    if first.trim_end() != "---" {
        return raw;
    }

    let mut offset = first.len();
    for line in lines {
        offset += line.len();
        if line.trim_end() == "---" {
            return &raw[offset..];
        }
    }
    // Unterminated front matter: treat the document as ordinary content.
    raw
}
