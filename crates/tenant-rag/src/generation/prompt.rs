//! Prompt templates for RAG generation

use std::cmp::Ordering;

use crate::types::VectorMatch;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from retrieved matches, most relevant first.
    ///
    /// Each block reads `[Document i] (Relevance: 0.87)` followed by the chunk
    /// text; blocks are separated by a blank line.
    pub fn build_context(matches: &[VectorMatch]) -> String {
        let mut ordered: Vec<&VectorMatch> = matches.iter().collect();
        ordered.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        ordered
            .iter()
            .enumerate()
            .map(|(i, m)| format!("[Document {}] (Relevance: {:.2})\n{}", i + 1, m.score, m.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the grounded question-answering prompt
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            "You are a helpful assistant that answers questions based on the provided context.\n\
             Use only the information from the context to answer the question.\n\
             If the context doesn't contain enough information to answer the question, say so clearly.\n\
             Be concise and accurate in your responses.\n\
             \n\
             Context:\n\
             {context}\n\
             \n\
             Question: {question}\n\
             \n\
             Answer:"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    fn hit(id: &str, score: f32, text: &str) -> VectorMatch {
        VectorMatch {
            id: id.to_string(),
            score,
            text: text.to_string(),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_context_format_and_order() {
        let context = PromptBuilder::build_context(&[
            hit("b", 0.5, "second"),
            hit("a", 0.876, "first"),
        ]);
        assert_eq!(
            context,
            "[Document 1] (Relevance: 0.88)\nfirst\n\n[Document 2] (Relevance: 0.50)\nsecond"
        );
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(PromptBuilder::build_context(&[]), "");
    }

    #[test]
    fn test_prompt_embeds_context_and_question() {
        let prompt = PromptBuilder::build_rag_prompt("What is X?", "[Document 1] (Relevance: 0.90)\nX is Y");
        assert!(prompt.starts_with(
            "You are a helpful assistant that answers questions based on the provided context.\n"
        ));
        assert!(prompt.contains("\n\nContext:\n[Document 1] (Relevance: 0.90)\nX is Y\n\nQuestion: What is X?\n\nAnswer:"));
        assert!(prompt.ends_with("Answer:"));
    }
}
