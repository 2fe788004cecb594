//! Pinecone serverless index over the data-plane REST API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::{Metadata, MetadataFilter, NamespaceStats, VectorMatch, VectorRecord};

use super::vector_store::VectorStoreProvider;

const API_VERSION: &str = "2024-07";
/// Ids per list page and per fetch request
const PAGE_SIZE: usize = 100;

/// Pinecone index client; one namespace per tenant
pub struct PineconeStore {
    client: Client,
    host: String,
    api_key: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: [&'a VectorRecord; 1],
    namespace: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(Deserialize)]
struct ScoredVector {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    namespaces: HashMap<String, NamespaceSummary>,
    #[serde(default)]
    total_vector_count: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: usize,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    vectors: Vec<ListItem>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ListItem {
    id: String,
}

#[derive(Deserialize)]
struct Pagination {
    next: Option<String>,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, FetchedVector>,
}

#[derive(Deserialize)]
struct FetchedVector {
    #[serde(default)]
    metadata: Option<Metadata>,
}

/// Control-plane view of an index
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    #[serde(default)]
    pub dimension: usize,
    #[serde(default)]
    pub metric: String,
    /// Data-plane host; may be empty while a new index initializes
    #[serde(default)]
    pub host: String,
}

/// Outcome of [`PineconeStore::ensure_index`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsuredIndex {
    /// The index was already there
    Existing(IndexDescription),
    /// The index was created by this call
    Created(IndexDescription),
}

/// Index-wide vector and namespace counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    pub total_vectors: usize,
    pub namespaces: usize,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: serde_json::Value,
}

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn api_key(config: &VectorDbConfig) -> Result<String> {
    config
        .pinecone_api_key
        .clone()
        .ok_or_else(|| Error::Config("PINECONE_API_KEY is required for Pinecone".to_string()))
}

impl PineconeStore {
    /// Create a client for a known index host
    pub fn new(host: &str, api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            host: normalize_host(host),
            api_key: api_key.into(),
        })
    }

    /// Build from configuration, resolving the index host through the
    /// control plane when only the index name is configured
    pub async fn connect(config: &VectorDbConfig) -> Result<Self> {
        let api_key = api_key(config)?;
        let host = match &config.index_host {
            Some(host) => host.clone(),
            None => Self::resolve_host(config, &api_key).await?,
        };
        tracing::info!(index = %config.index_name, host = %host, "Connected to Pinecone index");
        Self::new(&host, api_key, config.timeout_secs)
    }

    async fn resolve_host(config: &VectorDbConfig, api_key: &str) -> Result<String> {
        match Self::describe_index(config, api_key).await? {
            Some(description) if !description.host.is_empty() => Ok(description.host),
            Some(_) => Err(Error::store(format!(
                "Pinecone index '{}' has no host yet; it may still be initializing",
                config.index_name
            ))),
            None => Err(Error::Config(format!(
                "Pinecone index '{}' does not exist; create it with tenant-rag-create-index",
                config.index_name
            ))),
        }
    }

    /// Look the configured index up on the control plane; `None` when absent
    pub async fn describe_index(
        config: &VectorDbConfig,
        api_key: &str,
    ) -> Result<Option<IndexDescription>> {
        let url = format!(
            "{}/indexes/{}",
            config.control_plane_url.trim_end_matches('/'),
            config.index_name
        );
        let response = http_client(config.timeout_secs)?
            .get(&url)
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| Error::store(format!("Pinecone control plane unreachable: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::parse(response, "describe index").await.map(Some)
    }

    /// Create the configured serverless index (cosine metric) unless it
    /// already exists. An existing index is left untouched.
    pub async fn ensure_index(config: &VectorDbConfig, dimension: usize) -> Result<EnsuredIndex> {
        let api_key = api_key(config)?;

        if let Some(existing) = Self::describe_index(config, &api_key).await? {
            if existing.dimension != dimension {
                tracing::warn!(
                    index = %existing.name,
                    index_dimension = existing.dimension,
                    embedding_dimension = dimension,
                    "Existing Pinecone index dimension differs from the embedding dimension"
                );
            }
            return Ok(EnsuredIndex::Existing(existing));
        }

        tracing::info!(
            index = %config.index_name,
            dimension,
            cloud = %config.cloud,
            region = %config.region,
            "Creating Pinecone index"
        );
        let body = CreateIndexRequest {
            name: &config.index_name,
            dimension,
            metric: "cosine",
            spec: json!({"serverless": {"cloud": config.cloud, "region": config.region}}),
        };
        let response = http_client(config.timeout_secs)?
            .post(format!("{}/indexes", config.control_plane_url.trim_end_matches('/')))
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::store(format!("Pinecone control plane unreachable: {}", e)))?;

        let created: IndexDescription = Self::parse(response, "create index").await?;
        Ok(EnsuredIndex::Created(created))
    }

    /// Vector and namespace totals across the whole index
    pub async fn index_summary(&self) -> Result<IndexSummary> {
        let stats = self.describe_stats().await?;
        Ok(IndexSummary {
            total_vectors: stats.total_vector_count,
            namespaces: stats.namespaces.len(),
        })
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        let response = self
            .send(
                self.request(reqwest::Method::POST, "/describe_index_stats")
                    .json(&json!({})),
                "describe_index_stats",
            )
            .await?;
        Self::parse(response, "describe_index_stats").await
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| Error::store(format!("Pinecone {} failed: {}", operation, e)))
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response, operation: &str) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::store(format!(
                "Pinecone {} failed ({}): {}",
                operation, status, body
            )));
        }
        response
            .json()
            .await
            .map_err(|e| Error::store(format!("Unexpected Pinecone {} response: {}", operation, e)))
    }

    async fn delete(&self, body: serde_json::Value) -> Result<()> {
        let response = self
            .send(self.request(reqwest::Method::POST, "/vectors/delete").json(&body), "delete")
            .await?;

        // Deleting from a namespace that does not exist is a no-op
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let _: serde_json::Value = Self::parse(response, "delete").await?;
        Ok(())
    }

    async fn list_ids(&self, namespace: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut params = vec![
                ("namespace", namespace.to_string()),
                ("limit", PAGE_SIZE.to_string()),
            ];
            if let Some(token) = &token {
                params.push(("paginationToken", token.clone()));
            }

            let response = self
                .send(
                    self.request(reqwest::Method::GET, "/vectors/list").query(&params),
                    "list",
                )
                .await?;
            let page: ListResponse = Self::parse(response, "list").await?;
            ids.extend(page.vectors.into_iter().map(|v| v.id));

            token = page.pagination.and_then(|p| p.next);
            if token.is_none() {
                break;
            }
        }

        Ok(ids)
    }

    /// Every record id with its stored metadata
    async fn list_records(&self, namespace: &str) -> Result<Vec<(String, Metadata)>> {
        let ids = self.list_ids(namespace).await?;
        let mut records = Vec::with_capacity(ids.len());

        for batch in ids.chunks(PAGE_SIZE) {
            let mut params: Vec<(&str, &str)> = vec![("namespace", namespace)];
            params.extend(batch.iter().map(|id| ("ids", id.as_str())));

            let response = self
                .send(
                    self.request(reqwest::Method::GET, "/vectors/fetch").query(&params),
                    "fetch",
                )
                .await?;
            let fetched: FetchResponse = Self::parse(response, "fetch").await?;
            records.extend(
                fetched
                    .vectors
                    .into_iter()
                    .map(|(id, v)| (id, v.metadata.unwrap_or_default())),
            );
        }

        Ok(records)
    }
}

#[async_trait]
impl VectorStoreProvider for PineconeStore {
    async fn upsert(&self, namespace: &str, record: VectorRecord) -> Result<()> {
        let body = UpsertRequest {
            vectors: [&record],
            namespace,
        };
        let response = self
            .send(self.request(reqwest::Method::POST, "/vectors/upsert").json(&body), "upsert")
            .await?;
        let _: serde_json::Value = Self::parse(response, "upsert").await?;
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        let body = QueryRequest {
            namespace,
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };
        let response = self
            .send(self.request(reqwest::Method::POST, "/query").json(&body), "query")
            .await?;
        let result: QueryResponse = Self::parse(response, "query").await?;

        Ok(result
            .matches
            .into_iter()
            .map(|m| VectorMatch::from_metadata(m.id, m.score, m.metadata.unwrap_or_default()))
            .collect())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<usize> {
        let before = self.stats(namespace).await?.entry_count;
        self.delete(json!({"deleteAll": true, "namespace": namespace}))
            .await?;
        Ok(before)
    }

    async fn delete_matching(&self, namespace: &str, filter: &MetadataFilter) -> Result<()> {
        // Serverless indexes do not delete by metadata filter; resolve ids first
        let ids: Vec<String> = match filter {
            MetadataFilter::Ids(ids) => ids.clone(),
            MetadataFilter::FieldEquals { .. } => self
                .list_records(namespace)
                .await?
                .into_iter()
                .filter(|(id, metadata)| filter.matches(id, metadata))
                .map(|(id, _)| id)
                .collect(),
        };

        for batch in ids.chunks(PAGE_SIZE) {
            self.delete(json!({"ids": batch, "namespace": namespace}))
                .await?;
        }
        Ok(())
    }

    async fn stats(&self, namespace: &str) -> Result<NamespaceStats> {
        let stats = self.describe_stats().await?;

        Ok(NamespaceStats {
            entry_count: stats
                .namespaces
                .get(namespace)
                .map(|ns| ns.vector_count)
                .unwrap_or(0),
        })
    }

    async fn list_metadata(&self, namespace: &str) -> Result<Vec<Metadata>> {
        Ok(self
            .list_records(namespace)
            .await?
            .into_iter()
            .map(|(_, metadata)| metadata)
            .collect())
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .request(reqwest::Method::POST, "/describe_index_stats")
            .json(&json!({}))
            .send()
            .await;
        Ok(matches!(response, Ok(r) if r.status().is_success()))
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> PineconeStore {
        PineconeStore::new(&server.uri(), "pk-test", 5).unwrap()
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("rag-abc.svc.pinecone.io"),
            "https://rag-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[tokio::test]
    async fn test_upsert_targets_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(header("api-key", "pk-test"))
            .and(body_partial_json(json!({
                "namespace": "acme",
                "vectors": [{"id": "v1", "values": [0.5, 0.5]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let record = VectorRecord {
            id: "v1".to_string(),
            values: vec![0.5, 0.5],
            metadata: Metadata::new(),
        };
        store(&server).upsert("acme", record).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_maps_matches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_partial_json(json!({"namespace": "acme", "topK": 3, "includeMetadata": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    {"id": "v1", "score": 0.91, "metadata": {"text": "first", "tenant_id": "acme"}},
                    {"id": "v2", "score": 0.42, "metadata": {"text": "second"}}
                ],
                "namespace": "acme"
            })))
            .mount(&server)
            .await;

        let matches = store(&server).query("acme", &[1.0, 0.0], 3).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "v1");
        assert_eq!(matches[0].text, "first");
        assert_eq!(matches[1].text, "second");
    }

    #[tokio::test]
    async fn test_delete_namespace_reports_prior_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/describe_index_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "namespaces": {"acme": {"vectorCount": 7}},
                "dimension": 384,
                "totalVectorCount": 7
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vectors/delete"))
            .and(body_partial_json(json!({"deleteAll": true, "namespace": "acme"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(store(&server).delete_namespace("acme").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_delete_missing_namespace_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/describe_index_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"namespaces": {}})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vectors/delete"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Namespace not found"})))
            .mount(&server)
            .await;

        assert_eq!(store(&server).delete_namespace("ghost").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_by_filename_resolves_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vectors/list"))
            .and(query_param("namespace", "acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vectors": [{"id": "v1"}, {"id": "v2"}],
                "namespace": "acme"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vectors": {
                    "v1": {"id": "v1", "values": [], "metadata": {"filename": "a.pdf"}},
                    "v2": {"id": "v2", "values": [], "metadata": {"filename": "b.pdf"}}
                },
                "namespace": "acme"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vectors/delete"))
            .and(body_partial_json(json!({"ids": ["v1"], "namespace": "acme"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        store(&server)
            .delete_matching("acme", &MetadataFilter::filename("a.pdf"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connect_resolves_host() {
        let control = MockServer::start().await;
        let data = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/multi-tenant-rag"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "multi-tenant-rag",
                "dimension": 384,
                "metric": "cosine",
                "host": data.uri()
            })))
            .mount(&control)
            .await;

        let config = VectorDbConfig {
            pinecone_api_key: Some("pk-test".to_string()),
            control_plane_url: control.uri(),
            ..VectorDbConfig::default()
        };
        let store = PineconeStore::connect(&config).await.unwrap();
        assert_eq!(store.host(), data.uri());
    }

    fn control_config(control: &MockServer) -> VectorDbConfig {
        VectorDbConfig {
            pinecone_api_key: Some("pk-test".to_string()),
            control_plane_url: control.uri(),
            ..VectorDbConfig::default()
        }
    }

    #[tokio::test]
    async fn test_ensure_index_keeps_existing() {
        let control = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/multi-tenant-rag"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "multi-tenant-rag",
                "dimension": 384,
                "metric": "cosine",
                "host": "rag-abc.svc.pinecone.io"
            })))
            .mount(&control)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&control)
            .await;

        let ensured = PineconeStore::ensure_index(&control_config(&control), 384)
            .await
            .unwrap();
        match ensured {
            EnsuredIndex::Existing(index) => {
                assert_eq!(index.host, "rag-abc.svc.pinecone.io");
                assert_eq!(index.dimension, 384);
            }
            other => panic!("expected existing index, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ensure_index_creates_missing() {
        let control = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/multi-tenant-rag"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "NOT_FOUND", "message": "Resource multi-tenant-rag not found"}
            })))
            .mount(&control)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .and(header("api-key", "pk-test"))
            .and(body_partial_json(json!({
                "name": "multi-tenant-rag",
                "dimension": 384,
                "metric": "cosine",
                "spec": {"serverless": {"cloud": "aws", "region": "us-east-1"}}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "name": "multi-tenant-rag",
                "dimension": 384,
                "metric": "cosine",
                "host": "",
                "status": {"ready": false, "state": "Initializing"}
            })))
            .expect(1)
            .mount(&control)
            .await;

        let ensured = PineconeStore::ensure_index(&control_config(&control), 384)
            .await
            .unwrap();
        assert!(matches!(ensured, EnsuredIndex::Created(ref index) if index.metric == "cosine"));
    }

    #[tokio::test]
    async fn test_connect_to_missing_index_is_config_error() {
        let control = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/multi-tenant-rag"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&control)
            .await;

        assert!(matches!(
            PineconeStore::connect(&control_config(&control)).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_index_summary_counts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/describe_index_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "namespaces": {"acme": {"vectorCount": 4}, "globex": {"vectorCount": 2}},
                "dimension": 384,
                "totalVectorCount": 6
            })))
            .mount(&server)
            .await;

        let summary = store(&server).index_summary().await.unwrap();
        assert_eq!(
            summary,
            IndexSummary {
                total_vectors: 6,
                namespaces: 2
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_is_store_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(matches!(
            store(&server).query("acme", &[1.0], 1).await,
            Err(Error::StoreUnavailable(_))
        ));
    }
}
