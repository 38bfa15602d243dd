//! Document, page and chunk types with source tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// An uploaded PDF document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename
    pub filename: String,
    /// SHA-256 of the raw file bytes, hex encoded
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Number of pages in the PDF
    pub page_count: usize,
    /// When the document was ingested
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    /// Create a document record from its raw bytes
    pub fn new(filename: impl Into<String>, bytes: &[u8], page_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            content_hash: hash_content(bytes),
            file_size: bytes.len() as u64,
            page_count,
            ingested_at: Utc::now(),
        }
    }
}

/// Compute the content hash used for deduplication
pub fn hash_content(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Text of a single PDF page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// Owning document ID
    pub document_id: Uuid,
    /// Owning document filename
    pub filename: String,
    /// 1-based page number
    pub number: u32,
    /// Normalised page text
    pub text: String,
}

impl Page {
    /// Page length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkSource {
    /// Source filename
    pub filename: String,
    /// 1-based page number
    pub page_number: u32,
    /// Character offset of the chunk start within the page
    pub char_start: usize,
    /// Character offset one past the chunk end within the page
    pub char_end: usize,
}

/// A window of page text, the unit of embedding and retrieval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Chunk text
    pub content: String,
    /// Characters shared with the previous chunk of the same page
    pub overlap: usize,
    /// Position of the chunk within its document
    pub chunk_index: usize,
    /// Source page reference
    pub source: ChunkSource,
    /// Embedding vector, filled in before insertion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Attach an embedding
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_sha256() {
        assert_eq!(
            hash_content(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_document_new_records_size_and_hash() {
        let doc = Document::new("menu.pdf", b"%PDF-1.5 bytes", 2);
        assert_eq!(doc.file_size, 14);
        assert_eq!(doc.page_count, 2);
        assert_eq!(doc.content_hash, hash_content(b"%PDF-1.5 bytes"));
    }
}
