//! Overlapping text chunking with sentence and word boundary detection

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

/// Boundary markers in priority order. The first marker type that occurs in
/// the window wins, even if a lower-priority marker occurs later.
const BOUNDARY_MARKERS: [&str; 5] = [". ", "! ", "? ", "\n\n", "\n"];

/// Text chunker with configurable size and overlap
///
/// Sizes are measured in characters, never bytes, so multi-byte text is
/// never cut inside a code point.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Requires `0 < overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if overlap == 0 || overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap must satisfy 0 < overlap < chunk_size (got overlap={}, chunk_size={})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create from the chunking section of the configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split text into trimmed, non-empty, overlapping chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < len {
            let naive_end = (start + self.chunk_size).min(len);
            let end = if naive_end < len {
                self.find_break(&chars, start, naive_end)
            } else {
                naive_end
            };

            let chunk: String = chars[start..end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if end >= len {
                break;
            }
            start = end - self.overlap;
        }

        chunks
    }

    /// Choose the cut point for the window `[start, naive_end)`
    fn find_break(&self, chars: &[char], start: usize, naive_end: usize) -> usize {
        let window = &chars[start..naive_end];

        let cut = BOUNDARY_MARKERS
            .iter()
            .find_map(|marker| {
                let marker: Vec<char> = marker.chars().collect();
                rfind(window, &marker).map(|pos| pos + marker.len())
            })
            .or_else(|| rfind(window, &[' ']).map(|pos| pos + 1))
            .map(|offset| start + offset)
            .unwrap_or(naive_end);

        // A cut this early would move the cursor backwards once overlap is
        // subtracted, so fall back to a hard cut
        if cut <= start + self.overlap {
            naive_end
        } else {
            cut
        }
    }
}

/// Position of the last occurrence of `needle` fully inside `haystack`
fn rfind(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| &haystack[i..i + needle.len()] == needle)
}
