//! Chunk, vector record and match types stored in tenant namespaces

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::tenant::Tenant;

/// Arbitrary key-value metadata attached to a stored chunk
pub type Metadata = HashMap<String, serde_json::Value>;

/// Metadata key holding the chunk text
pub const TEXT_KEY: &str = "text";
/// Metadata key holding the owning tenant id
pub const TENANT_KEY: &str = "tenant_id";
/// Metadata key holding the originating filename
pub const FILENAME_KEY: &str = "filename";

/// A chunk of text ready to be embedded, with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Chunk text
    pub text: String,
    /// Chunk metadata (filename, chunk index, total chunks, ...)
    #[serde(default)]
    pub metadata: Metadata,
}

impl DocumentChunk {
    /// Create a chunk with empty metadata
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Create a chunk with metadata
    pub fn with_metadata(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Turn this chunk into a storable record under a fresh id.
    ///
    /// The stored payload always carries `text` and `tenant_id`; caller
    /// metadata is merged on top and wins on key conflicts.
    pub fn into_record(self, tenant: &Tenant, values: Vec<f32>) -> VectorRecord {
        let mut metadata = Metadata::with_capacity(self.metadata.len() + 2);
        metadata.insert(TEXT_KEY.to_string(), serde_json::json!(self.text));
        metadata.insert(TENANT_KEY.to_string(), serde_json::json!(tenant.as_str()));
        metadata.extend(self.metadata);

        VectorRecord {
            id: Uuid::new_v4().to_string(),
            values,
            metadata,
        }
    }
}

/// A vector entry as written to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique record id (UUID v4 string)
    pub id: String,
    /// Embedding vector
    pub values: Vec<f32>,
    /// Payload stored alongside the vector
    pub metadata: Metadata,
}

impl VectorRecord {
    /// Stored text, if present
    pub fn text(&self) -> &str {
        metadata_str(&self.metadata, TEXT_KEY).unwrap_or("")
    }
}

/// A similarity query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Record id
    pub id: String,
    /// Cosine similarity (higher is more relevant)
    pub score: f32,
    /// Stored chunk text
    pub text: String,
    /// Full stored metadata
    pub metadata: Metadata,
}

impl VectorMatch {
    /// Build a match from stored metadata, lifting the text out of it
    pub fn from_metadata(id: impl Into<String>, score: f32, metadata: Metadata) -> Self {
        let text = metadata_str(&metadata, TEXT_KEY).unwrap_or("").to_string();
        Self {
            id: id.into(),
            score,
            text,
            metadata,
        }
    }
}

/// Entry count for a namespace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceStats {
    /// Number of vectors stored in the namespace
    pub entry_count: usize,
}

/// Selects records for deletion inside a single namespace
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataFilter {
    /// Delete the records with these ids
    Ids(Vec<String>),
    /// Delete records whose metadata field equals the given value
    FieldEquals {
        field: String,
        value: serde_json::Value,
    },
}

impl MetadataFilter {
    /// Filter matching every chunk that came from `filename`
    pub fn filename(filename: impl Into<String>) -> Self {
        Self::FieldEquals {
            field: FILENAME_KEY.to_string(),
            value: serde_json::Value::String(filename.into()),
        }
    }

    /// Whether a record with this id and metadata is selected
    pub fn matches(&self, id: &str, metadata: &Metadata) -> bool {
        match self {
            MetadataFilter::Ids(ids) => ids.iter().any(|candidate| candidate == id),
            MetadataFilter::FieldEquals { field, value } => metadata.get(field) == Some(value),
        }
    }
}

/// An uploaded file as received from a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename
    pub filename: String,
    /// Raw file bytes
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    /// Case-insensitive `.pdf` extension check
    pub fn is_pdf(&self) -> bool {
        self.filename.to_lowercase().ends_with(".pdf")
    }
}

/// Read a string field out of metadata
pub fn metadata_str<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(|v| v.as_str())
}
