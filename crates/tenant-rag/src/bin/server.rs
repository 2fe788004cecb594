//! Multi-tenant RAG API server
//!
//! Run with: cargo run -p tenant-rag --bin tenant-rag-server -- --config rag.toml

use clap::Parser;
use std::path::PathBuf;
use tenant_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "tenant-rag-server", version, about = "Multi-tenant RAG API server")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config);

    tracing::info!("Configuration loaded");
    tracing::info!("  - Environment: {}", config.app.environment);
    tracing::info!(
        "  - Embeddings: {:?} {} ({} dims)",
        config.embeddings.provider,
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!("  - LLM: {:?}", config.llm.provider);
    tracing::info!("  - Vector store: {:?}", config.vector_db.provider);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config).await?;
    server.state().rag().probe_providers().await;

    tracing::info!("Health: http://{}/health", server.address());
    server.start().await?;

    Ok(())
}

fn init_tracing(config: &RagConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("tenant_rag={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json || config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
