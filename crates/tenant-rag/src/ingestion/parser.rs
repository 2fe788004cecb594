//! PDF text extraction

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

/// Upper bound for a single pdf-extract run
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Separator placed between page texts
pub const PAGE_SEPARATOR: &str = "\n\n";

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank-line regex"));

/// Text pulled out of a PDF
#[derive(Debug, Clone, Default)]
pub struct ExtractedPdf {
    /// Cleaned text, pages separated by a blank line
    pub text: String,
    /// Number of pages reported by the document, if it could be loaded
    pub page_count: Option<usize>,
}

impl ExtractedPdf {
    /// Whether no usable text was found
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extracts plain text from PDF bytes.
///
/// `pdf-extract` runs first on a worker thread with a timeout; on failure,
/// panic, timeout or blank output the pages are read one at a time with
/// `lopdf`.
pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract text from a PDF held in memory
    pub fn extract(filename: &str, data: &[u8]) -> Result<ExtractedPdf> {
        let page_count = lopdf::Document::load_mem(data)
            .ok()
            .map(|doc| doc.get_pages().len());

        let primary = Self::extract_with_timeout(data);
        let text = match primary {
            Ok(text) if !text.trim().is_empty() => text,
            primary => match Self::extract_pages_fallback(data) {
                Ok(Some(text)) => text,
                // Loadable but textless: report an empty document
                Ok(None) => String::new(),
                Err(fallback_err) => match primary {
                    Ok(_) => String::new(),
                    Err(primary_err) => {
                        tracing::warn!(
                            filename,
                            "PDF extraction failed: {}; fallback: {}",
                            primary_err,
                            fallback_err
                        );
                        return Err(Error::file_parse(filename, primary_err));
                    }
                },
            },
        };

        let text = cleanup_pdf_text(&text);
        tracing::info!(
            filename,
            pages = page_count.unwrap_or(0),
            chars = text.chars().count(),
            "Extracted PDF text"
        );

        Ok(ExtractedPdf { text, page_count })
    }

    fn extract_with_timeout(data: &[u8]) -> std::result::Result<String, String> {
        let data = data.to_vec();
        let (tx, rx) = mpsc::channel();

        // pdf-extract can panic or spin on malformed fonts
        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(EXTRACT_TIMEOUT) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Ok(text)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::debug!("pdf-extract failed: {}", e);
                Err(format!("Failed to parse PDF: {}", e))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!(
                    "pdf-extract timed out after {}s",
                    EXTRACT_TIMEOUT.as_secs()
                );
                Err("PDF extraction timed out".to_string())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("pdf-extract worker crashed");
                Err("PDF extraction crashed".to_string())
            }
        }
    }

    /// Per-page extraction with lopdf; textless pages are skipped.
    /// `Ok(None)` means the document loaded but no page had text.
    fn extract_pages_fallback(data: &[u8]) -> std::result::Result<Option<String>, String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| format!("Failed to load PDF: {}", e))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) if !text.trim().is_empty() => pages.push(text),
                Ok(_) => {}
                Err(e) => tracing::debug!("Could not read page {}: {}", page_number, e),
            }
        }

        if pages.is_empty() {
            return Ok(None);
        }
        Ok(Some(pages.join(PAGE_SEPARATOR)))
    }
}

/// Normalize extracted text: ligatures, odd spaces, NULs and blank-line runs
pub fn cleanup_pdf_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace('\u{000C}', PAGE_SEPARATOR)
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace("\r\n", "\n");

    let text = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    BLANK_LINES
        .replace_all(&text, PAGE_SEPARATOR)
        .trim()
        .to_string()
}


#[cfg(test)]
mod tests {
    use super::fixtures::pdf_with_pages;
    use super::*;

    #[test]
    fn test_extracts_text_and_page_count() {
        let data = pdf_with_pages(&["Quarterly revenue grew strongly", "Second page notes"]);
        let extracted = PdfExtractor::extract("report.pdf", &data).unwrap();

        assert_eq!(extracted.page_count, Some(2));
        assert!(extracted.text.contains("Quarterly"));
        assert!(extracted.text.contains("Second"));
    }

    #[test]
    fn test_blank_pdf_is_empty_not_error() {
        let data = pdf_with_pages(&[""]);
        let extracted = PdfExtractor::extract("blank.pdf", &data).unwrap();
        assert!(extracted.is_empty());
    }

    #[test]
    fn test_garbage_bytes_fail_with_filename() {
        let err = PdfExtractor::extract("broken.pdf", b"definitely not a pdf").unwrap_err();
        match err {
            Error::FileParse { filename, .. } => assert_eq!(filename, "broken.pdf"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_cleanup() {
        let raw = "  of\u{FB01}ce\u{00A0}hours  \r\n\n\n\n\nnext\0 page \n";
        assert_eq!(cleanup_pdf_text(raw), "office hours\n\nnext page");
    }
}
