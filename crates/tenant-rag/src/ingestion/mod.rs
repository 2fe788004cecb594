//! Document ingestion: PDF extraction and chunking

mod chunker;
pub mod parser;
mod processor;

pub use chunker::TextChunker;
pub use parser::{ExtractedPdf, PdfExtractor};
pub use processor::PdfProcessor;
