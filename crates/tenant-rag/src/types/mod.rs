//! Core types for the RAG system

pub mod document;
pub mod query;
pub mod response;

pub use document::{
    DocumentChunk, Metadata, MetadataFilter, NamespaceStats, UploadedFile, VectorMatch,
    VectorRecord,
};
pub use query::{DocumentUploadRequest, QueryRequest};
pub use response::{QueryResponse, Source, INSUFFICIENT_INFORMATION_ANSWER};
