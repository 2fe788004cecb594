//! RAG orchestration: upload, retrieval and answer generation per tenant

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::ingestion::{PdfProcessor, TextChunker};
use crate::providers::{EmbeddingProvider, GenerationOptions, LlmProvider, VectorStoreProvider};
use crate::tenant::Tenant;
use crate::types::document::{metadata_str, FILENAME_KEY};
use crate::types::query::MAX_DOCUMENT_CHARS;
use crate::types::{
    DocumentChunk, Metadata, MetadataFilter, QueryRequest, QueryResponse, Source, UploadedFile,
    INSUFFICIENT_INFORMATION_ANSWER,
};

/// Result of a batch file upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileUploadOutcome {
    /// Files that contributed at least one chunk
    pub files_processed: usize,
    /// Chunks stored across all files
    pub total_chunks: usize,
    /// Stored chunk ids in input order
    pub document_ids: Vec<String>,
}

/// Entry count of a tenant namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantStats {
    pub namespace: String,
    pub entry_count: usize,
}

/// Trim text and enforce the non-empty and maximum-length rules
pub fn sanitize_text(text: &str, max_chars: usize) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::BadRequest("Text input cannot be empty".to_string()));
    }
    if trimmed.chars().count() > max_chars {
        return Err(Error::BadRequest(format!(
            "Text input exceeds maximum length of {} characters",
            max_chars
        )));
    }
    Ok(trimmed.to_string())
}

/// Tenant-scoped RAG pipeline over injected providers
pub struct RagService {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    processor: PdfProcessor,
    default_top_k: usize,
    generation: GenerationOptions,
}

impl RagService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        chunker: TextChunker,
        default_top_k: usize,
        generation: GenerationOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            processor: PdfProcessor::new(chunker),
            default_top_k,
            generation,
        }
    }

    /// Wire providers with chunking, retrieval and generation settings from `config`
    pub fn from_config(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        Ok(Self::new(
            embedder,
            store,
            llm,
            TextChunker::from_config(&config.chunking)?,
            config.rag.top_k_results,
            GenerationOptions::from_config(&config.llm),
        ))
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Requested `top_k`, or the configured default
    pub fn resolve_top_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_top_k)
    }

    /// Embed and store one text document, returning its id
    pub async fn upload_document(
        &self,
        tenant: &Tenant,
        text: &str,
        metadata: Option<Metadata>,
    ) -> Result<String> {
        let text = sanitize_text(text, MAX_DOCUMENT_CHARS)?;
        tracing::info!(tenant = %tenant, chars = text.chars().count(), "Uploading document");

        let values = self.embedder.embed(&text).await?;
        let chunk = DocumentChunk::with_metadata(text, metadata.unwrap_or_default());
        let record = chunk.into_record(tenant, values);
        let id = record.id.clone();

        self.store.upsert(&tenant.namespace(), record).await?;

        tracing::info!(tenant = %tenant, document_id = %id, "Document uploaded");
        Ok(id)
    }

    /// Extract, chunk, embed and store a batch of PDFs.
    ///
    /// Non-PDF files and PDFs without extractable text are skipped; the call
    /// fails only when nothing at all could be stored.
    pub async fn upload_files(
        &self,
        tenant: &Tenant,
        files: Vec<UploadedFile>,
    ) -> Result<FileUploadOutcome> {
        if files.is_empty() {
            return Err(Error::BadRequest("No files provided".to_string()));
        }

        let mut all_chunks: Vec<DocumentChunk> = Vec::new();
        let mut files_processed = 0;

        for file in files {
            if !file.is_pdf() {
                tracing::warn!(tenant = %tenant, filename = %file.filename, "Skipping non-PDF file");
                continue;
            }

            let processor = self.processor.clone();
            let owner = tenant.clone();
            let filename = file.filename.clone();
            let processed = tokio::task::spawn_blocking(move || processor.process(&file, &owner))
                .await
                .map_err(|e| Error::internal(format!("PDF processing task failed: {}", e)))?;

            match processed {
                Ok(chunks) if chunks.is_empty() => {
                    tracing::warn!(tenant = %tenant, filename = %filename, "No text extracted, skipping");
                }
                Ok(chunks) => {
                    tracing::info!(
                        tenant = %tenant,
                        filename = %filename,
                        chunks = chunks.len(),
                        "Processed file"
                    );
                    files_processed += 1;
                    all_chunks.extend(chunks);
                }
                Err(e) => {
                    tracing::warn!(tenant = %tenant, filename = %filename, "Skipping unreadable PDF: {}", e);
                }
            }
        }

        if all_chunks.is_empty() {
            return Err(Error::NoExtractableContent(
                "No valid PDF files found or no text could be extracted".to_string(),
            ));
        }

        let texts: Vec<String> = all_chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != all_chunks.len() {
            return Err(Error::embedding(format!(
                "Requested {} embeddings, received {}",
                all_chunks.len(),
                embeddings.len()
            )));
        }

        let namespace = tenant.namespace();
        let mut document_ids = Vec::with_capacity(all_chunks.len());
        for (chunk, values) in all_chunks.into_iter().zip(embeddings) {
            let record = chunk.into_record(tenant, values);
            document_ids.push(record.id.clone());
            self.store.upsert(&namespace, record).await?;
        }

        tracing::info!(
            tenant = %tenant,
            files = files_processed,
            chunks = document_ids.len(),
            "Uploaded files"
        );

        Ok(FileUploadOutcome {
            files_processed,
            total_chunks: document_ids.len(),
            document_ids,
        })
    }

    /// Answer a question from the tenant's own documents
    pub async fn query(&self, tenant: &Tenant, request: QueryRequest) -> Result<QueryResponse> {
        let request = request.validate()?;
        let top_k = self.resolve_top_k(request.top_k);
        tracing::info!(tenant = %tenant, top_k, "Processing query");

        let vector = self.embedder.embed(&request.question).await?;
        let mut matches = self
            .store
            .query(&tenant.namespace(), &vector, top_k)
            .await?;

        if matches.is_empty() {
            tracing::warn!(tenant = %tenant, "No documents found for query");
            return Ok(QueryResponse {
                answer: INSUFFICIENT_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
                tenant_id: tenant.to_string(),
                question: request.question,
            });
        }

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let context = PromptBuilder::build_context(&matches);
        let prompt = PromptBuilder::build_rag_prompt(&request.question, &context);
        tracing::debug!(tenant = %tenant, matches = matches.len(), prompt_chars = prompt.len(), "Built prompt");

        let answer = self.llm.generate(&prompt, &self.generation).await?;
        let sources = matches.iter().map(Source::from_match).collect();

        tracing::info!(tenant = %tenant, "Query completed");
        Ok(QueryResponse {
            answer: answer.trim().to_string(),
            sources,
            tenant_id: tenant.to_string(),
            question: request.question,
        })
    }

    /// Delete every stored entry of the tenant, returning the prior count
    pub async fn delete_tenant(&self, tenant: &Tenant) -> Result<usize> {
        let deleted = self.store.delete_namespace(&tenant.namespace()).await?;
        tracing::info!(tenant = %tenant, deleted, "Deleted tenant data");
        Ok(deleted)
    }

    pub async fn tenant_stats(&self, tenant: &Tenant) -> Result<TenantStats> {
        let namespace = tenant.namespace();
        let stats = self.store.stats(&namespace).await?;
        Ok(TenantStats {
            namespace,
            entry_count: stats.entry_count,
        })
    }

    /// Unique filenames stored for the tenant, sorted
    pub async fn list_documents(&self, tenant: &Tenant) -> Result<Vec<String>> {
        let metadata = self.store.list_metadata(&tenant.namespace()).await?;
        let filenames: BTreeSet<String> = metadata
            .iter()
            .filter_map(|m| metadata_str(m, FILENAME_KEY))
            .map(str::to_string)
            .collect();
        Ok(filenames.into_iter().collect())
    }

    /// Delete every chunk that came from `filename`
    pub async fn delete_document(&self, tenant: &Tenant, filename: &str) -> Result<()> {
        if filename.trim().is_empty() {
            return Err(Error::BadRequest("Filename cannot be empty".to_string()));
        }
        self.store
            .delete_matching(&tenant.namespace(), &MetadataFilter::filename(filename))
            .await?;
        tracing::info!(tenant = %tenant, filename, "Deleted document");
        Ok(())
    }

    /// Log the health of each provider; never fails
    pub async fn probe_providers(&self) {
        let embedder = self.embedder.health_check().await.unwrap_or(false);
        let store = self.store.health_check().await.unwrap_or(false);
        let llm = self.llm.health_check().await.unwrap_or(false);

        for (kind, name, healthy) in [
            ("embedding", self.embedder.name(), embedder),
            ("vector store", self.store.name(), store),
            ("llm", self.llm.name(), llm),
        ] {
            if healthy {
                tracing::info!("{} provider '{}' is available", kind, name);
            } else {
                tracing::warn!("{} provider '{}' is not reachable", kind, name);
            }
        }
    }
}
