//! Streaming ask proxy: forwards `/api/embed` and `/api/ask` to the
//! upstream provider with the server-held credential injected.
//!
//! Run with:
//!   DOCSMITH_API_KEY=... docsmith-proxy --bind 127.0.0.1:8787

use std::net::SocketAddr;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use docsmith::proxy::{serve, ProxyState};
use docsmith::Settings;

#[derive(Debug, Parser)]
#[command(name = "docsmith-proxy", about = "Serve the streaming ask proxy")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "DOCSMITH_BIND", default_value = "127.0.0.1:8787")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "proxy failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    let state = ProxyState::new(settings.upstream_url, settings.api_key);
    serve(args.bind, state).await?;
    Ok(())
}
