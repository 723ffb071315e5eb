use anyhow::Result;
use artsearch_core::catalog::load_catalog;
use artsearch_core::{EngineConfig, SearchEngine};
use clap::Parser;
use artsearch_server::build_app;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Catalog file (.json / .jsonl) or directory to index at startup
    #[arg(long)]
    catalog: Option<String>,
    /// Engine configuration (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let engine = Arc::new(SearchEngine::new(config)?);
    if let Some(path) = &args.catalog {
        let items = load_catalog(path)?;
        engine.index_corpus(&items);
    } else {
        tracing::warn!("no --catalog given, serving an empty index until POST /index");
    }
    let app = build_app(engine);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
