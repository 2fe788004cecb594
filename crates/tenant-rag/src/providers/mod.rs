//! Provider abstractions for embeddings, generation and vector storage
//!
//! Trait objects let the server switch between a local stack (Ollama plus
//! the in-memory store) and hosted services (HuggingFace, Gemini, Pinecone).

pub mod embedding;
pub mod gemini;
pub mod huggingface;
pub mod llm;
pub mod memory;
pub mod ollama;
pub mod pinecone;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::{GenerationOptions, LlmProvider};
pub use vector_store::VectorStoreProvider;
