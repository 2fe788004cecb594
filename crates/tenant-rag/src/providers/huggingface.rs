//! HuggingFace Inference API embedder (sentence-transformers feature extraction)

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::embedding::{ensure_dimensions, EmbeddingProvider};

/// Embeds text through the hosted feature-extraction pipeline
pub struct HuggingFaceEmbedder {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    dimensions: usize,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

impl HuggingFaceEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/pipeline/feature-extraction/{}",
                config.huggingface_base_url.trim_end_matches('/'),
                config.model
            ),
            api_token: config.huggingface_api_token.clone(),
            dimensions: config.dimensions,
        })
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut request = self.client.post(&self.endpoint).json(&FeatureExtractionRequest {
            inputs,
            options: RequestOptions {
                wait_for_model: true,
            },
        });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::embedding(format!("HuggingFace request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "HuggingFace embedding failed ({}): {}",
                status, body
            )));
        }

        let vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Unexpected HuggingFace response: {}", e)))?;

        if vectors.len() != inputs.len() {
            return Err(Error::embedding(format!(
                "Requested {} embeddings, received {}",
                inputs.len(),
                vectors.len()
            )));
        }

        vectors
            .into_iter()
            .map(|v| ensure_dimensions(v, self.dimensions))
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::embedding("HuggingFace returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(count = texts.len(), "Embedding batch with HuggingFace");
        self.request(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.embed("health check").await.is_ok())
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}
