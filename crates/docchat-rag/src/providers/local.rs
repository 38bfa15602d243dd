//! Local vector store provider backed by the SQLite index

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::SqliteVectorStore;
use crate::types::{Chunk, Document, ScoredChunk, StoreStats};

use super::vector_store::VectorStoreProvider;

/// Async wrapper running the synchronous SQLite store on the blocking pool
#[derive(Clone)]
pub struct LocalVectorStore {
    store: Arc<SqliteVectorStore>,
}

impl LocalVectorStore {
    /// Wrap an existing store
    pub fn new(store: Arc<SqliteVectorStore>) -> Self {
        Self { store }
    }

    /// Open (or create) the index in `directory`
    pub fn open_or_create<P: AsRef<Path>>(directory: P) -> Result<Self> {
        Ok(Self::new(Arc::new(SqliteVectorStore::open_or_create(directory)?)))
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteVectorStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn insert(&self, document: &Document, chunks: &[Chunk]) -> Result<()> {
        let document = document.clone();
        let chunks = chunks.to_vec();
        self.blocking(move |store| store.insert(&document, &chunks)).await
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let vector = vector.to_vec();
        self.blocking(move |store| store.query(&vector, k)).await
    }

    async fn count(&self) -> Result<usize> {
        self.blocking(|store| store.count()).await
    }

    async fn contains_hash(&self, content_hash: &str) -> Result<bool> {
        let hash = content_hash.to_string();
        self.blocking(move |store| store.contains_hash(&hash)).await
    }

    async fn documents(&self) -> Result<Vec<Document>> {
        self.blocking(|store| store.documents()).await
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.blocking(|store| store.stats()).await
    }

    fn name(&self) -> &str {
        "local-sqlite"
    }
}
