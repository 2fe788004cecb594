//! tenant-rag: Multi-tenant RAG API with namespace-isolated vector storage
//!
//! Each tenant, identified by the `X-Tenant-ID` header, gets its own vector
//! namespace. Documents are chunked and embedded on upload, and questions are
//! answered by a language model grounded in the tenant's retrieved chunks.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod rag;
pub mod server;
pub mod tenant;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use rag::RagService;
pub use server::RagServer;
pub use tenant::Tenant;
pub use types::{
    query::{DocumentUploadRequest, QueryRequest},
    response::{QueryResponse, Source},
};
