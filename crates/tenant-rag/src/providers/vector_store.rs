//! Vector store provider trait; every operation is scoped to one namespace

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Metadata, MetadataFilter, NamespaceStats, VectorMatch, VectorRecord};

/// Trait for namespaced vector storage and similarity search
///
/// Implementations:
/// - `MemoryVectorStore`: in-process store, cosine similarity
/// - `PineconeStore`: Pinecone serverless index over REST
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert or replace a record by id
    async fn upsert(&self, namespace: &str, record: VectorRecord) -> Result<()>;

    /// Most similar records first, at most `top_k`; empty if the namespace is empty
    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize)
        -> Result<Vec<VectorMatch>>;

    /// Remove the whole namespace, returning the entry count present beforehand
    async fn delete_namespace(&self, namespace: &str) -> Result<usize>;

    /// Remove records selected by `filter`
    async fn delete_matching(&self, namespace: &str, filter: &MetadataFilter) -> Result<()>;

    /// Entry count for a namespace
    async fn stats(&self, namespace: &str) -> Result<NamespaceStats>;

    /// Stored metadata of every record in the namespace
    async fn list_metadata(&self, namespace: &str) -> Result<Vec<Metadata>>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
