//! Request types for uploads and queries

use serde::{Deserialize, Serialize};

use super::document::Metadata;
use crate::error::{Error, Result};

/// Maximum stored document length in characters
pub const MAX_DOCUMENT_CHARS: usize = 50_000;
/// Maximum question length in characters
pub const MAX_QUESTION_CHARS: usize = 1_000;
/// Smallest accepted `top_k`
pub const MIN_TOP_K: usize = 1;
/// Largest accepted `top_k`
pub const MAX_TOP_K: usize = 20;

/// Body of `POST /documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUploadRequest {
    /// Document text content
    pub text: String,
    /// Optional metadata stored with the document
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Body of `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,
    /// Number of documents to retrieve; `None` uses the configured default
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Check field bounds and trim the question
    pub fn validate(mut self) -> Result<Self> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(Error::Validation(
                "Question cannot be empty or whitespace only".to_string(),
            ));
        }
        if question.chars().count() > MAX_QUESTION_CHARS {
            return Err(Error::Validation(format!(
                "Question exceeds maximum length of {} characters",
                MAX_QUESTION_CHARS
            )));
        }
        if let Some(top_k) = self.top_k {
            if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
                return Err(Error::Validation(format!(
                    "top_k must be between {} and {}",
                    MIN_TOP_K, MAX_TOP_K
                )));
            }
        }

        self.question = question.to_string();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_is_trimmed() {
        let request = QueryRequest::new("  What is the refund policy?  ")
            .validate()
            .unwrap();
        assert_eq!(request.question, "What is the refund policy?");
        assert_eq!(request.top_k, None);
    }

    #[test]
    fn test_rejects_empty_and_long_questions() {
        assert!(QueryRequest::new("").validate().is_err());
        assert!(QueryRequest::new("   ").validate().is_err());
        assert!(QueryRequest::new("q".repeat(1001)).validate().is_err());
        assert!(QueryRequest::new("q".repeat(1000)).validate().is_ok());
    }

    #[test]
    fn test_top_k_bounds() {
        assert!(QueryRequest::new("why?").with_top_k(0).validate().is_err());
        assert!(QueryRequest::new("why?").with_top_k(21).validate().is_err());
        assert!(QueryRequest::new("why?").with_top_k(1).validate().is_ok());
        assert!(QueryRequest::new("why?").with_top_k(20).validate().is_ok());
    }

    #[test]
    fn test_deserialize_optional_fields() {
        let request: QueryRequest = serde_json::from_str(r#"{"question": "hi?"}"#).unwrap();
        assert_eq!(request.top_k, None);

        let upload: DocumentUploadRequest = serde_json::from_str(r#"{"text": "body"}"#).unwrap();
        assert!(upload.metadata.is_none());
    }
}
