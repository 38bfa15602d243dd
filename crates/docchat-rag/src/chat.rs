//! Document chat facade: the contract offered to presentation surfaces

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::AnswerSynthesizer;
use crate::ingestion::{IngestPipeline, IngestStage};
use crate::providers::{
    build_embedder, build_llm, EmbeddingProvider, LlmProvider, LocalVectorStore,
    VectorStoreProvider,
};
use crate::retrieval::{QueryPipeline, Retriever};
use crate::types::{Answer, Document, IngestReport, StoreStats};

/// Provider reachability, as reported by `/ready`
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProviderHealth {
    pub embedder: bool,
    pub llm: bool,
}

/// Owns the providers and both pipelines
#[derive(Clone)]
pub struct DocumentChat {
    inner: Arc<Inner>,
}

struct Inner {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStoreProvider>,
    ingest: IngestPipeline,
    query: QueryPipeline,
}

impl DocumentChat {
    /// Build the configured providers and open the index
    pub async fn from_config(config: RagConfig) -> Result<Self> {
        let embedder = build_embedder(&config.embeddings)?;
        let llm = build_llm(&config.llm)?;

        let index_dir = config.storage.index_dir.clone();
        let store = tokio::task::spawn_blocking(move || LocalVectorStore::open_or_create(index_dir))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        Self::with_providers(config, embedder, llm, Arc::new(store)).await
    }

    /// Assemble from explicit providers
    pub async fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        config.validate()?;

        if let Some(dimension) = store.stats().await?.dimension {
            if dimension != embedder.dimensions() {
                return Err(Error::Config(format!(
                    "index holds {}-dimensional vectors but {} produces {}; use a fresh index_dir",
                    dimension,
                    embedder.name(),
                    embedder.dimensions()
                )));
            }
        }

        let ingest = IngestPipeline::from_config(&config, embedder.clone(), store.clone())?;
        let query = QueryPipeline::new(
            embedder.clone(),
            Retriever::from_config(store.clone(), &config.retrieval),
            AnswerSynthesizer::from_config(llm.clone(), &config.llm),
            Duration::from_secs(config.embeddings.timeout_secs),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                embedder,
                llm,
                store,
                ingest,
                query,
            }),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Index the PDF at `path`
    pub async fn process_document(&self, path: &Path) -> Result<IngestReport> {
        self.inner.ingest.process(path).await
    }

    /// Save an uploaded PDF into the data directory, then index it.
    ///
    /// Path components in `filename` are discarded; an existing file with the
    /// same name is overwritten.
    pub async fn upload_document(&self, filename: &str, bytes: &[u8]) -> Result<IngestReport> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| Error::ingest(IngestStage::Loading, Error::load(filename, "invalid filename")))?;

        let data_dir = &self.inner.config.storage.data_dir;
        let path = self.save_upload(data_dir, &name, bytes).await.map_err(|e| {
            tracing::error!(filename = %name, error = %e, "Failed to save upload");
            Error::ingest(IngestStage::Loading, e)
        })?;

        tracing::info!(filename = %name, bytes = bytes.len(), "Upload saved");
        self.process_document(&path).await
    }

    async fn save_upload(&self, data_dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Answer a question from the indexed documents
    pub async fn answer_question(&self, question: &str) -> Result<Answer> {
        self.inner.query.answer(question).await
    }

    /// Index statistics
    pub async fn stats(&self) -> Result<StoreStats> {
        self.inner.store.stats().await
    }

    /// Registered documents, oldest first
    pub async fn documents(&self) -> Result<Vec<Document>> {
        self.inner.store.documents().await
    }

    /// Whether the index currently holds anything
    pub async fn has_documents(&self) -> Result<bool> {
        Ok(!self.inner.store.is_empty().await?)
    }

    /// Probe the model backends
    pub async fn health(&self) -> ProviderHealth {
        let (embedder, llm) = tokio::join!(
            self.inner.embedder.health_check(),
            self.inner.llm.health_check()
        );
        ProviderHealth {
            embedder: embedder.unwrap_or(false),
            llm: llm.unwrap_or(false),
        }
    }

    pub fn embedder_name(&self) -> &str {
        self.inner.embedder.name()
    }

    pub fn llm_name(&self) -> &str {
        self.inner.llm.name()
    }

    pub fn llm_model(&self) -> &str {
        self.inner.llm.model()
    }
}

/// Last path component of an uploaded filename, if usable
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .unwrap_or_default();

    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}
