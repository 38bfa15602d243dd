//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, Document, ScoredChunk, StoreStats};

/// Trait for persistent, append-only vector storage
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Append a document and its embedded chunks in one atomic batch
    async fn insert(&self, document: &Document, chunks: &[Chunk]) -> Result<()>;

    /// Nearest chunks by cosine similarity, best first, ties in insertion order
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of stored entries
    async fn count(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }

    /// Whether a document with this content hash was committed
    async fn contains_hash(&self, content_hash: &str) -> Result<bool>;

    /// Registered documents, oldest first
    async fn documents(&self) -> Result<Vec<Document>>;

    /// Entry, document and dimension counts
    async fn stats(&self) -> Result<StoreStats>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
