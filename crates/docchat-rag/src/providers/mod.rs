//! Provider abstractions for embeddings, generation and vector storage
//!
//! The concrete backends are chosen from configuration once at startup and
//! injected into the pipelines as trait objects.

pub mod embedding;
pub mod gemini;
pub mod hashing;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod vector_store;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig, LlmBackend, LlmConfig};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiLlm;
pub use hashing::HashingEmbedder;
pub use llm::LlmProvider;
pub use local::LocalVectorStore;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use vector_store::VectorStoreProvider;

/// Build the configured embedding provider
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(config)?),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.dimensions)?),
    };
    tracing::info!(
        provider = embedder.name(),
        dimensions = embedder.dimensions(),
        "Embedding provider ready"
    );
    Ok(embedder)
}

/// Build the configured generation provider
pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.provider {
        LlmBackend::Gemini => Arc::new(GeminiLlm::new(config)?),
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(config)?),
    };
    tracing::info!(provider = llm.name(), model = llm.model(), "LLM provider ready");
    Ok(llm)
}
