//! Top-k retrieval over the vector store

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::providers::VectorStoreProvider;
use crate::types::ScoredChunk;

/// Returns the stored chunks closest to a query vector
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStoreProvider>,
    top_k: usize,
    min_similarity: Option<f32>,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStoreProvider>,
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Self {
        Self {
            store,
            top_k,
            min_similarity,
        }
    }

    /// Create from config
    pub fn from_config(store: Arc<dyn VectorStoreProvider>, config: &RetrievalConfig) -> Self {
        Self::new(store, config.top_k, config.min_similarity)
    }

    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.store
    }

    /// Best `top_k` chunks, best first; with a threshold set, only those scoring at least that
    pub async fn retrieve(&self, vector: &[f32]) -> Result<Vec<ScoredChunk>> {
        let mut results = self.store.query(vector, self.top_k).await?;
        let before = results.len();
        if let Some(threshold) = self.min_similarity {
            results.retain(|r| r.score >= threshold);
        }

        tracing::debug!(
            retrieved = before,
            kept = results.len(),
            best = results.first().map(|r| r.score),
            "Retrieved context"
        );
        Ok(results)
    }
}
