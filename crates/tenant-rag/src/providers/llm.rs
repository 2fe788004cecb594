//! LLM provider trait for generating answers

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::Result;

/// Sampling options for a generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Maximum tokens in the answer
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl GenerationOptions {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (phi3, llama3, etc.)
/// - `GeminiClient`: Google Generative Language API (gemini-1.5-flash)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a fully built prompt
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
