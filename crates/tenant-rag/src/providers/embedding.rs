//! Embedding provider trait for turning text into vectors

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (all-minilm)
/// - `HuggingFaceEmbedder`: HuggingFace Inference API (sentence-transformers)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Embedding dimensions (384 for all-MiniLM-L6-v2)
    fn dimensions(&self) -> usize;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Reject model output whose length differs from the configured dimension
pub fn ensure_dimensions(embedding: Vec<f32>, expected: usize) -> Result<Vec<f32>> {
    if embedding.len() != expected {
        return Err(Error::embedding(format!(
            "Expected {} dimensions, model returned {}",
            expected,
            embedding.len()
        )));
    }
    Ok(embedding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dimensions() {
        assert!(ensure_dimensions(vec![0.0; 384], 384).is_ok());
        assert!(matches!(
            ensure_dimensions(vec![0.0; 768], 384),
            Err(Error::EmbeddingUnavailable(_))
        ));
    }
}
