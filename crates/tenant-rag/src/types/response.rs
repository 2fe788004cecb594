//! Response types for the HTTP API

use serde::{Deserialize, Serialize};

use super::document::VectorMatch;

/// Number of characters of source text returned per source
pub const SOURCE_SNIPPET_CHARS: usize = 200;

/// Answer returned when nothing relevant was retrieved
pub const INSUFFICIENT_INFORMATION_ANSWER: &str =
    "I don't have enough information to answer this question. Please upload relevant documents first.";

/// A retrieved source returned with an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Stored chunk id
    pub id: String,
    /// Leading snippet of the chunk text followed by `...`
    pub text: String,
    /// Similarity score rounded to 4 decimals
    pub score: f64,
}

impl Source {
    /// Format a retrieved match for the response
    pub fn from_match(m: &VectorMatch) -> Self {
        Self {
            id: m.id.clone(),
            text: truncate_snippet(&m.text, SOURCE_SNIPPET_CHARS),
            score: round_score(m.score, 4),
        }
    }
}

/// First `max_chars` characters of `text` followed by an ellipsis
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let mut snippet: String = text.chars().take(max_chars).collect();
    snippet.push_str("...");
    snippet
}

/// Round a score to the given number of decimal places
pub fn round_score(score: f32, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (f64::from(score) * factor).round() / factor
}

/// Response of `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated (or canned) answer
    pub answer: String,
    /// Retrieved sources, most relevant first
    pub sources: Vec<Source>,
    /// Tenant identifier
    pub tenant_id: String,
    /// The question as answered (trimmed)
    pub question: String,
}

/// Response of `POST /documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUploadResponse {
    pub success: bool,
    pub document_id: String,
    pub message: String,
    pub tenant_id: String,
}

/// Response of `POST /upload-files`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub success: bool,
    /// Files that contributed at least one chunk
    pub files_processed: usize,
    pub total_chunks: usize,
    /// Stored chunk ids in input file order
    pub document_ids: Vec<String>,
    pub message: String,
    pub tenant_id: String,
}

/// Response of `DELETE /tenant`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantDeleteResponse {
    pub success: bool,
    pub message: String,
    pub tenant_id: String,
    pub documents_deleted: usize,
}

/// Response of `GET /tenant/stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantStatsResponse {
    pub tenant_id: String,
    pub namespace: String,
    pub document_count: usize,
}

/// Response of `GET /tenant/documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantDocumentsResponse {
    pub tenant_id: String,
    /// Unique filenames, sorted
    pub documents: Vec<String>,
}

/// Response of `DELETE /tenant/documents/:filename`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDeleteResponse {
    pub success: bool,
    pub message: String,
    pub tenant_id: String,
}

/// Response of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::Metadata;

    #[test]
    fn test_source_truncates_long_text() {
        let m = VectorMatch {
            id: "chunk-1".to_string(),
            score: 0.876_543_2,
            text: "a".repeat(500),
            metadata: Metadata::new(),
        };
        let source = Source::from_match(&m);

        assert_eq!(source.id, "chunk-1");
        assert_eq!(source.text.chars().count(), 203);
        assert!(source.text.ends_with("..."));
        assert_eq!(source.score, 0.8765);
    }

    #[test]
    fn test_short_text_still_gets_ellipsis() {
        assert_eq!(truncate_snippet("short", 200), "short...");
    }

    #[test]
    fn test_truncate_is_char_aware() {
        let text = "é".repeat(300);
        let snippet = truncate_snippet(&text, 200);
        assert_eq!(snippet.chars().count(), 203);
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.123_456, 4), 0.1235);
        assert_eq!(round_score(1.0, 4), 1.0);
        assert_eq!(round_score(0.8, 2), 0.8);
    }
}
