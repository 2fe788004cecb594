//! Pinecone index setup
//!
//! Creates the configured serverless index if it is missing, otherwise
//! reports its stats. Run once before starting the server with the Pinecone
//! vector store:
//!
//!   cargo run -p tenant-rag --bin tenant-rag-create-index -- --config rag.toml

use clap::Parser;
use std::path::PathBuf;
use tenant_rag::config::RagConfig;
use tenant_rag::providers::pinecone::{EnsuredIndex, PineconeStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "tenant-rag-create-index", version, about = "Create the Pinecone index")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Index name (defaults to the configured one)
    #[arg(long)]
    index_name: Option<String>,

    /// Vector dimension (defaults to the embedding dimension)
    #[arg(long)]
    dimension: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "tenant_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(name) = args.index_name {
        config.vector_db.index_name = name;
    }
    let dimension = args.dimension.unwrap_or(config.embeddings.dimensions);
    let db = &config.vector_db;

    println!("Pinecone index setup for {}", config.app.name);
    println!("  Index: {}", db.index_name);

    match PineconeStore::ensure_index(db, dimension).await? {
        EnsuredIndex::Existing(index) => {
            println!("Index '{}' already exists", index.name);
            println!("  Dimension: {}", index.dimension);
            println!("  Metric: {}", index.metric);

            if index.host.is_empty() {
                println!("  Stats unavailable until the index is ready");
            } else {
                let api_key = db.pinecone_api_key.clone().unwrap_or_default();
                let store = PineconeStore::new(&index.host, api_key, db.timeout_secs)?;
                let summary = store.index_summary().await?;
                println!("  Total vectors: {}", summary.total_vectors);
                println!("  Namespaces: {}", summary.namespaces);
            }
        }
        EnsuredIndex::Created(index) => {
            println!("Index '{}' created", index.name);
            println!("  Cloud/region: {}/{}", db.cloud, db.region);
            println!("  Dimension: {}", index.dimension);
            println!("  Metric: {}", index.metric);
            if index.host.is_empty() {
                println!("  The index is initializing; its host appears once it is ready.");
            } else {
                println!("  Host: {}", index.host);
            }
        }
    }

    Ok(())
}
