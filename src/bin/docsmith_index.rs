//! Offline index build: Markdown corpus in, `search-index.json` out.
//!
//! Run with:
//!   DOCSMITH_API_KEY=... docsmith-index --docs-dir docs --out-file public/search-index.json

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use docsmith::embeddings::HttpEmbeddingClient;
use docsmith::index::{write_artifact, IndexBuilder, IndexError, ARTIFACT_FILE_NAME};
use docsmith::Settings;

#[derive(Debug, Parser)]
#[command(name = "docsmith-index", about = "Build the documentation search index")]
struct Args {
    /// Root of the Markdown corpus.
    #[arg(long, env = "DOCSMITH_DOCS_DIR", default_value = ".")]
    docs_dir: PathBuf,

    /// Destination for the index artifact.
    #[arg(long, env = "DOCSMITH_OUT_FILE", default_value_os_t = default_out_file())]
    out_file: PathBuf,
}

fn default_out_file() -> PathBuf {
    PathBuf::from("public").join(ARTIFACT_FILE_NAME)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "index build failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), IndexError> {
    let settings = Settings::from_env()?;

    let provider = Arc::new(HttpEmbeddingClient::new(
        &settings.upstream_url,
        &settings.api_key,
        &settings.embed_model,
    ));
    let builder = IndexBuilder::new(provider)
        .with_batch_size(settings.embed_batch_size)
        .with_min_segment_chars(settings.min_segment_chars);

    let index = builder.build(&args.docs_dir).await?;
    write_artifact(&index, &args.out_file).await
}
