//! In-process vector store keyed by namespace

use async_trait::async_trait;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Metadata, MetadataFilter, NamespaceStats, VectorMatch, VectorRecord};

use super::vector_store::VectorStoreProvider;

#[derive(Debug, Clone)]
struct StoredVector {
    values: Vec<f32>,
    metadata: Metadata,
}

/// Brute-force cosine search over per-namespace maps.
///
/// Contents live only as long as the process.
pub struct MemoryVectorStore {
    namespaces: DashMap<String, HashMap<String, StoredVector>>,
    dimensions: usize,
}

impl MemoryVectorStore {
    /// Create a store accepting vectors of exactly `dimensions` values
    pub fn new(dimensions: usize) -> Self {
        Self {
            namespaces: DashMap::new(),
            dimensions,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn check_dimensions(&self, len: usize) -> Result<()> {
        if len != self.dimensions {
            return Err(Error::store(format!(
                "Vector dimension {} does not match index dimension {}",
                len, self.dimensions
            )));
        }
        Ok(())
    }
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorStoreProvider for MemoryVectorStore {
    async fn upsert(&self, namespace: &str, record: VectorRecord) -> Result<()> {
        self.check_dimensions(record.values.len())?;
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(
                record.id,
                StoredVector {
                    values: record.values,
                    metadata: record.metadata,
                },
            );
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        self.check_dimensions(vector.len())?;
        let Some(entries) = self.namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, &String, &StoredVector)> = entries
            .iter()
            .map(|(id, stored)| (cosine_similarity(vector, &stored.values), id, stored))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, id, stored)| {
                VectorMatch::from_metadata(id.clone(), score, stored.metadata.clone())
            })
            .collect())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<usize> {
        Ok(self
            .namespaces
            .remove(namespace)
            .map(|(_, entries)| entries.len())
            .unwrap_or(0))
    }

    async fn delete_matching(&self, namespace: &str, filter: &MetadataFilter) -> Result<()> {
        if let Some(mut entries) = self.namespaces.get_mut(namespace) {
            entries.retain(|id, stored| !filter.matches(id, &stored.metadata));
        }
        Ok(())
    }

    async fn stats(&self, namespace: &str) -> Result<NamespaceStats> {
        Ok(NamespaceStats {
            entry_count: self
                .namespaces
                .get(namespace)
                .map(|entries| entries.len())
                .unwrap_or(0),
        })
    }

    async fn list_metadata(&self, namespace: &str) -> Result<Vec<Metadata>> {
        Ok(self
            .namespaces
            .get(namespace)
            .map(|entries| entries.values().map(|s| s.metadata.clone()).collect())
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, values: Vec<f32>, text: &str) -> VectorRecord {
        let mut metadata = Metadata::new();
        metadata.insert("text".to_string(), json!(text));
        VectorRecord {
            id: id.to_string(),
            values,
            metadata,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let store = MemoryVectorStore::new(2);
        store.upsert("acme", record("a", vec![1.0, 0.0], "east")).await.unwrap();
        store.upsert("acme", record("b", vec![0.0, 1.0], "north")).await.unwrap();
        store.upsert("acme", record("c", vec![0.7, 0.7], "northeast")).await.unwrap();

        let matches = store.query("acme", &[1.0, 0.1], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[0].text, "east");
        assert_eq!(matches[1].id, "c");
        assert!(matches[0].score >= matches[1].score);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = MemoryVectorStore::new(2);
        store.upsert("acme", record("a", vec![1.0, 0.0], "secret")).await.unwrap();

        assert!(store.query("globex", &[1.0, 0.0], 5).await.unwrap().is_empty());
        assert_eq!(store.stats("globex").await.unwrap().entry_count, 0);
        assert_eq!(store.delete_namespace("globex").await.unwrap(), 0);
        assert_eq!(store.stats("acme").await.unwrap().entry_count, 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = MemoryVectorStore::new(2);
        store.upsert("acme", record("a", vec![1.0, 0.0], "v1")).await.unwrap();
        store.upsert("acme", record("a", vec![1.0, 0.0], "v2")).await.unwrap();

        let matches = store.query("acme", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "v2");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = MemoryVectorStore::new(3);
        assert!(matches!(
            store.upsert("acme", record("a", vec![1.0, 0.0], "x")).await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(store.query("acme", &[1.0], 1).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_namespace_and_filter() {
        let store = MemoryVectorStore::new(2);
        let mut doc = record("a", vec![1.0, 0.0], "x");
        doc.metadata.insert("filename".to_string(), json!("a.pdf"));
        store.upsert("acme", doc).await.unwrap();
        store.upsert("acme", record("b", vec![0.0, 1.0], "y")).await.unwrap();
        store.upsert("acme", record("c", vec![0.5, 0.5], "z")).await.unwrap();

        store
            .delete_matching("acme", &MetadataFilter::filename("a.pdf"))
            .await
            .unwrap();
        store
            .delete_matching("acme", &MetadataFilter::Ids(vec!["b".to_string()]))
            .await
            .unwrap();
        assert_eq!(store.list_metadata("acme").await.unwrap().len(), 1);

        assert_eq!(store.delete_namespace("acme").await.unwrap(), 1);
        assert_eq!(store.stats("acme").await.unwrap().entry_count, 0);
    }
}
