//! PDF processing: extract, split and tag chunks

use serde_json::json;

use super::chunker::TextChunker;
use super::parser::PdfExtractor;
use crate::error::Result;
use crate::tenant::Tenant;
use crate::types::document::FILENAME_KEY;
use crate::types::{DocumentChunk, Metadata, UploadedFile};

/// Turns uploaded PDFs into metadata-tagged chunks
#[derive(Debug, Clone)]
pub struct PdfProcessor {
    chunker: TextChunker,
}

impl PdfProcessor {
    pub fn new(chunker: TextChunker) -> Self {
        Self { chunker }
    }

    /// Extract and split one PDF.
    ///
    /// Each chunk carries `chunk_index`, `total_chunks`, `filename`,
    /// `source: "pdf"` and `uploaded_by`. A textless PDF yields no chunks;
    /// unreadable bytes are an `Error::FileParse`.
    pub fn process(&self, file: &UploadedFile, tenant: &Tenant) -> Result<Vec<DocumentChunk>> {
        let extracted = PdfExtractor::extract(&file.filename, &file.data)?;
        if extracted.is_empty() {
            tracing::warn!(filename = %file.filename, "No text could be extracted");
            return Ok(Vec::new());
        }

        let pieces = self.chunker.split(&extracted.text);
        let total_chunks = pieces.len();

        let chunks: Vec<DocumentChunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| {
                let mut metadata = Metadata::with_capacity(5);
                metadata.insert("chunk_index".to_string(), json!(chunk_index));
                metadata.insert("total_chunks".to_string(), json!(total_chunks));
                metadata.insert(FILENAME_KEY.to_string(), json!(file.filename));
                metadata.insert("source".to_string(), json!("pdf"));
                metadata.insert("uploaded_by".to_string(), json!(tenant.as_str()));
                DocumentChunk::with_metadata(text, metadata)
            })
            .collect();

        tracing::info!(
            filename = %file.filename,
            tenant = %tenant,
            chunks = chunks.len(),
            "Processed PDF"
        );
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::parser::fixtures::pdf_with_pages;
    use crate::types::document::metadata_str;

    fn processor() -> PdfProcessor {
        PdfProcessor::new(TextChunker::new(1000, 200).unwrap())
    }

    #[test]
    fn test_chunks_carry_file_metadata() {
        let tenant = Tenant::validate("acme").unwrap();
        let file = UploadedFile::new(
            "handbook.pdf",
            pdf_with_pages(&["Employees accrue vacation monthly"]),
        );

        let chunks = processor().process(&file, &tenant).unwrap();
        assert_eq!(chunks.len(), 1);

        let metadata = &chunks[0].metadata;
        assert_eq!(metadata_str(metadata, "filename"), Some("handbook.pdf"));
        assert_eq!(metadata_str(metadata, "source"), Some("pdf"));
        assert_eq!(metadata_str(metadata, "uploaded_by"), Some("acme"));
        assert_eq!(metadata.get("chunk_index"), Some(&json!(0)));
        assert_eq!(metadata.get("total_chunks"), Some(&json!(1)));
        assert!(chunks[0].text.contains("vacation"));
    }

    #[test]
    fn test_blank_pdf_yields_no_chunks() {
        let tenant = Tenant::validate("acme").unwrap();
        let file = UploadedFile::new("scan.pdf", pdf_with_pages(&[""]));
        assert!(processor().process(&file, &tenant).unwrap().is_empty());
    }
}
