//! Fixed-size character window chunking with per-page source tracking

use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, Page};

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    max_size: usize,
    /// Characters shared by consecutive chunks of a page
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `max_size`
    pub fn new(max_size: usize, overlap: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(Error::Chunk("max_size must be positive".to_string()));
        }
        if overlap >= max_size {
            return Err(Error::Chunk(format!(
                "overlap ({}) must be smaller than max_size ({})",
                overlap, max_size
            )));
        }
        Ok(Self { max_size, overlap })
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split every page into windows; pages never share a chunk
    pub fn split(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for (start, end) in self.windows(page.char_len()) {
                let overlap = if start == 0 { 0 } else { self.overlap };
                chunks.push(Chunk {
                    id: Uuid::new_v4(),
                    document_id: page.document_id,
                    content: char_slice(&page.text, start, end),
                    overlap,
                    chunk_index: chunks.len(),
                    source: ChunkSource {
                        filename: page.filename.clone(),
                        page_number: page.number,
                        char_start: start,
                        char_end: end,
                    },
                    embedding: None,
                });
            }
        }
        chunks
    }

    /// Character ranges covering a text of `len` characters
    fn windows(&self, len: usize) -> Vec<(usize, usize)> {
        let step = self.max_size - self.overlap;
        let mut ranges = Vec::new();
        let mut start = 0;

        while start < len {
            let end = (start + self.max_size).min(len);
            ranges.push((start, end));
            if end == len {
                break;
            }
            start += step;
        }

        ranges
    }
}

fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end - start).collect()
}
