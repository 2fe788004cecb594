//! Configuration for the RAG system
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::query::{MAX_DOCUMENT_CHARS, MAX_TOP_K, MIN_TOP_K};

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Application identity
    pub app: AppConfig,
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Generation configuration
    pub llm: LlmConfig,
    /// Vector store configuration
    pub vector_db: VectorDbConfig,
    /// Retrieval settings
    pub rag: RetrievalConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl RagConfig {
    /// Load configuration: defaults, then `path` (if any), then environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    /// Parse TOML configuration text; missing keys keep their defaults
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("APP_ENV") {
            self.app.environment = v;
        }
        if let Some(v) = get("APP_NAME") {
            self.app.name = v;
        }
        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        override_parsed(&get, "PORT", &mut self.server.port)?;
        if let Some(v) = get("ALLOWED_ORIGINS") {
            self.server.allowed_origins = split_list(&v);
        }

        override_parsed(&get, "EMBEDDING_PROVIDER", &mut self.embeddings.provider)?;
        if let Some(v) = get("EMBEDDING_MODEL") {
            self.embeddings.model = v;
        }
        override_parsed(&get, "EMBEDDING_DIMENSION", &mut self.embeddings.dimensions)?;
        if let Some(v) = get("HUGGINGFACE_API_TOKEN") {
            self.embeddings.huggingface_api_token = Some(v);
        }

        if let Some(v) = get("OLLAMA_BASE_URL") {
            self.embeddings.ollama_base_url = v.clone();
            self.llm.ollama_base_url = v;
        }
        override_parsed(&get, "LLM_PROVIDER", &mut self.llm.provider)?;
        if let Some(v) = get("OLLAMA_MODEL") {
            self.llm.ollama_model = v;
        }
        if let Some(v) = get("GOOGLE_API_KEY") {
            self.llm.gemini_api_key = Some(v);
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.llm.gemini_model = v;
        }
        override_parsed(&get, "MAX_TOKENS", &mut self.llm.max_tokens)?;
        override_parsed(&get, "TEMPERATURE", &mut self.llm.temperature)?;

        override_parsed(&get, "VECTOR_STORE", &mut self.vector_db.provider)?;
        if let Some(v) = get("PINECONE_API_KEY") {
            self.vector_db.pinecone_api_key = Some(v);
        }
        if let Some(v) = get("PINECONE_INDEX_NAME") {
            self.vector_db.index_name = v;
        }
        if let Some(v) = get("PINECONE_INDEX_HOST") {
            self.vector_db.index_host = Some(v);
        }
        if let Some(v) = get("PINECONE_CLOUD") {
            self.vector_db.cloud = v;
        }
        if let Some(v) = get("PINECONE_ENVIRONMENT") {
            self.vector_db.region = v;
        }

        override_parsed(&get, "TOP_K_RESULTS", &mut self.rag.top_k_results)?;
        override_parsed(&get, "CHUNK_SIZE", &mut self.chunking.chunk_size)?;
        override_parsed(&get, "CHUNK_OVERLAP", &mut self.chunking.chunk_overlap)?;

        if let Some(v) = get("LOG_LEVEL") {
            self.logging.level = v.to_lowercase();
        }
        override_parsed(&get, "LOG_JSON", &mut self.logging.json)?;

        Ok(())
    }

    /// Check cross-field invariants and required credentials
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.chunk_overlap == 0 || chunking.chunk_overlap >= chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be > 0 and < chunk_size ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }
        if chunking.chunk_size > MAX_DOCUMENT_CHARS {
            return Err(Error::Config(format!(
                "chunk_size ({}) must not exceed {} characters",
                chunking.chunk_size, MAX_DOCUMENT_CHARS
            )));
        }

        if !(MIN_TOP_K..=MAX_TOP_K).contains(&self.rag.top_k_results) {
            return Err(Error::Config(format!(
                "top_k_results must be between {} and {}",
                MIN_TOP_K, MAX_TOP_K
            )));
        }

        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embedding dimensions must be positive".to_string()));
        }

        if self.llm.provider == LlmBackend::Gemini && self.llm.gemini_api_key.is_none() {
            return Err(Error::Config(
                "Gemini generation selected but GOOGLE_API_KEY is not set".to_string(),
            ));
        }

        if self.vector_db.provider == VectorStoreBackend::Pinecone {
            if self.vector_db.pinecone_api_key.is_none() {
                return Err(Error::Config(
                    "Pinecone vector store selected but PINECONE_API_KEY is not set".to_string(),
                ));
            }
            if self.vector_db.index_host.is_none() && self.vector_db.index_name.is_empty() {
                return Err(Error::Config(
                    "Pinecone requires either an index host or an index name".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Whether running in production mode
    pub fn is_production(&self) -> bool {
        self.app.environment.eq_ignore_ascii_case("production")
    }
}

fn override_parsed<T, G>(get: &G, name: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(name) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))?;
    }
    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Application identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name
    pub name: String,
    /// Deployment environment (development, staging, production)
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Multi-Tenant RAG API".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Allowed CORS origins (`*` allows any)
    pub allowed_origins: Vec<String>,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8000".to_string(),
            ],
            max_upload_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// HuggingFace Inference API (sentence-transformers)
    HuggingFace,
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            other => Err(format!("unknown embedding provider '{}'", other)),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which embedding backend to use
    pub provider: EmbeddingBackend,
    /// Model name (Ollama tag or HuggingFace model id)
    pub model: String,
    /// Embedding dimensions; must match the vector index
    pub dimensions: usize,
    /// Ollama base URL
    pub ollama_base_url: String,
    /// HuggingFace Inference API base URL
    pub huggingface_base_url: String,
    /// HuggingFace API token (optional, raises rate limits)
    #[serde(skip_serializing)]
    pub huggingface_api_token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Ollama,
            model: "all-minilm".to_string(), // all-MiniLM-L6-v2, 384 dims
            dimensions: 384,
            ollama_base_url: "http://localhost:11434".to_string(),
            huggingface_base_url: "https://api-inference.huggingface.co".to_string(),
            huggingface_api_token: None,
            timeout_secs: 60,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Generation backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Google Gemini (Generative Language API)
    Gemini,
}

impl FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            other => Err(format!("unknown LLM provider '{}'", other)),
        }
    }
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which generation backend to use
    pub provider: LlmBackend,
    /// Ollama base URL
    pub ollama_base_url: String,
    /// Ollama generation model
    pub ollama_model: String,
    /// Gemini API base URL
    pub gemini_base_url: String,
    /// Gemini model name
    pub gemini_model: String,
    /// Google API key for Gemini
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    /// Maximum tokens in a generated answer
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for failed Ollama requests (0 disables retrying)
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::Ollama,
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "phi3".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            gemini_api_key: None,
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

/// Vector store backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreBackend {
    /// In-process store, lost on restart
    #[default]
    Memory,
    /// Pinecone serverless index
    Pinecone,
}

impl FromStr for VectorStoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "pinecone" => Ok(Self::Pinecone),
            other => Err(format!("unknown vector store '{}'", other)),
        }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Which vector store to use
    pub provider: VectorStoreBackend,
    /// Pinecone API key
    #[serde(skip_serializing)]
    pub pinecone_api_key: Option<String>,
    /// Pinecone index name (resolved to a host at start-up)
    pub index_name: String,
    /// Pinecone index host; skips resolution when set
    pub index_host: Option<String>,
    /// Pinecone control plane URL
    pub control_plane_url: String,
    /// Cloud for newly created serverless indexes
    pub cloud: String,
    /// Region for newly created serverless indexes
    pub region: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreBackend::Memory,
            pinecone_api_key: None,
            index_name: "multi-tenant-rag".to_string(),
            index_host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Documents retrieved per query when the request does not say
    pub top_k_results: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k_results: 5 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.rag.top_k_results, 5);
        assert_eq!(config.embeddings.dimensions, 384);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RagConfig::default();
        config
            .apply_vars(vars(&[
                ("PORT", "9000"),
                ("APP_ENV", "production"),
                ("TOP_K_RESULTS", "8"),
                ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
                ("LLM_PROVIDER", "gemini"),
                ("GOOGLE_API_KEY", "secret"),
                ("PINECONE_ENVIRONMENT", "eu-west-1"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(config.is_production());
        assert_eq!(config.rag.top_k_results, 8);
        assert_eq!(config.server.allowed_origins.len(), 2);
        assert_eq!(config.llm.provider, LlmBackend::Gemini);
        assert_eq!(config.vector_db.region, "eu-west-1");
        assert_eq!(config.vector_db.cloud, "aws");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_value_is_config_error() {
        let mut config = RagConfig::default();
        let err = config.apply_vars(vars(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_chunking() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_caps_chunk_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_size = MAX_DOCUMENT_CHARS;
        assert!(config.validate().is_ok());

        config.chunking.chunk_size = MAX_DOCUMENT_CHARS + 1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut config = RagConfig::default();
        config.vector_db.provider = VectorStoreBackend::Pinecone;
        assert!(config.validate().is_err());

        config.vector_db.pinecone_api_key = Some("pk".to_string());
        assert!(config.validate().is_ok());

        config.llm.provider = LlmBackend::Gemini;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8088

[chunking]
chunk_size = 500
chunk_overlap = 50

[vector_db]
provider = "pinecone"
index_host = "rag-abc123.svc.pinecone.io"
"#
        )
        .unwrap();

        let config = RagConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.vector_db.provider, VectorStoreBackend::Pinecone);
        assert_eq!(config.llm.max_tokens, 1000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            RagConfig::from_toml("[server\nport = 1"),
            Err(Error::Config(_))
        ));
    }
}
