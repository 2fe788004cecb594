//! Application state for the RAG server

use std::sync::Arc;

use crate::config::{EmbeddingBackend, LlmBackend, RagConfig, VectorStoreBackend};
use crate::error::Result;
use crate::providers::{
    gemini::GeminiClient,
    huggingface::HuggingFaceEmbedder,
    memory::MemoryVectorStore,
    ollama::{OllamaClient, OllamaEmbedder, OllamaLlm},
    pinecone::PineconeStore,
    EmbeddingProvider, LlmProvider, VectorStoreProvider,
};
use crate::rag::RagService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Orchestrator over the configured providers
    rag: RagService,
}

impl AppState {
    /// Create providers from configuration and wire the RAG service
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing RAG application state (embeddings: {:?}, llm: {:?}, vector store: {:?})",
            config.embeddings.provider,
            config.llm.provider,
            config.vector_db.provider
        );

        // Embeddings and generation share one client when both run on Ollama
        let ollama = Arc::new(OllamaClient::from_config(&config.llm)?);

        let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
            EmbeddingBackend::Ollama => {
                if config.embeddings.ollama_base_url == config.llm.ollama_base_url {
                    Arc::new(OllamaEmbedder::from_client(
                        Arc::clone(&ollama),
                        config.embeddings.model.clone(),
                        config.embeddings.dimensions,
                    ))
                } else {
                    Arc::new(OllamaEmbedder::new(&config.embeddings, config.llm.max_retries)?)
                }
            }
            EmbeddingBackend::HuggingFace => Arc::new(HuggingFaceEmbedder::new(&config.embeddings)?),
        };
        tracing::info!(
            "Embedding provider: {} ({}, {} dims)",
            embedder.name(),
            config.embeddings.model,
            embedder.dimensions()
        );

        let llm: Arc<dyn LlmProvider> = match config.llm.provider {
            LlmBackend::Ollama => Arc::new(OllamaLlm::from_client(
                Arc::clone(&ollama),
                config.llm.ollama_model.clone(),
            )),
            LlmBackend::Gemini => Arc::new(GeminiClient::new(&config.llm)?),
        };
        tracing::info!("LLM provider: {} ({})", llm.name(), llm.model());

        let store: Arc<dyn VectorStoreProvider> = match config.vector_db.provider {
            VectorStoreBackend::Memory => {
                Arc::new(MemoryVectorStore::new(config.embeddings.dimensions))
            }
            VectorStoreBackend::Pinecone => Arc::new(PineconeStore::connect(&config.vector_db).await?),
        };
        tracing::info!("Vector store: {}", store.name());

        let rag = RagService::from_config(&config, embedder, store, llm)?;
        Ok(Self::from_service(config, rag))
    }

    /// Build state around an already wired service
    pub fn from_service(config: RagConfig, rag: RagService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, rag }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn rag(&self) -> &RagService {
        &self.inner.rag
    }
}
