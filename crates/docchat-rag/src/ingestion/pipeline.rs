//! Ingestion state machine: load, chunk, embed, check for duplicates, insert

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{DedupPolicy, RagConfig};
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{Chunk, IngestOutcome, IngestReport};

use super::chunker::TextChunker;
use super::loader::{LoadedPdf, PdfLoader};

const EMBED_BATCH_SIZE: usize = 32;

/// Ingestion states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    Idle,
    Loading,
    Chunking,
    Embedding,
    CheckingDuplicate,
    Inserting,
    Done,
    Failed,
}

impl IngestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::CheckingDuplicate => "checking_duplicate",
            Self::Inserting => "inserting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage bookkeeping for one run
struct IngestRun {
    stage: IngestStage,
    visited: Vec<IngestStage>,
    started: Instant,
}

impl IngestRun {
    fn start() -> Self {
        Self {
            stage: IngestStage::Idle,
            visited: vec![IngestStage::Idle],
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: IngestStage) {
        debug_assert!(!self.stage.is_terminal(), "ingestion already finished");
        tracing::debug!(from = %self.stage, to = %next, "Ingestion stage");
        self.stage = next;
        self.visited.push(next);
    }

    /// Tag `err` with the current stage and move to `Failed`
    fn fail(&mut self, err: Error) -> Error {
        let stage = self.stage;
        self.advance(IngestStage::Failed);
        Error::ingest(stage, err)
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Loader → Chunker → Embedder → duplicate check → Vector Store
#[derive(Clone)]
pub struct IngestPipeline {
    loader: PdfLoader,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    dedup: DedupPolicy,
    embed_timeout: Duration,
}

impl IngestPipeline {
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        dedup: DedupPolicy,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            loader: PdfLoader,
            chunker,
            embedder,
            store,
            dedup,
            embed_timeout,
        }
    }

    /// Create from config
    pub fn from_config(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        Ok(Self::new(
            TextChunker::from_config(&config.chunking)?,
            embedder,
            store,
            config.ingestion.dedup,
            Duration::from_secs(config.embeddings.timeout_secs),
        ))
    }

    /// Index the PDF at `path`.
    ///
    /// A skipped duplicate is a successful run with `IngestOutcome::Skipped`.
    /// Any failure leaves the store untouched and reports the stage it occurred in.
    pub async fn process(&self, path: &Path) -> Result<IngestReport> {
        let mut run = IngestRun::start();
        tracing::info!(path = %path.display(), "Ingesting document");

        run.advance(IngestStage::Loading);
        let loaded = match self.loader.load(path) {
            Ok(loaded) => loaded,
            Err(e) => return Err(self.failed(&mut run, e)),
        };

        self.process_loaded(run, loaded).await
    }

    async fn process_loaded(&self, mut run: IngestRun, loaded: LoadedPdf) -> Result<IngestReport> {
        let LoadedPdf { document, pages } = loaded;

        run.advance(IngestStage::Chunking);
        let chunks = self.chunker.split(&pages);
        tracing::debug!(
            filename = %document.filename,
            pages = pages.len(),
            chunks = chunks.len(),
            "Document chunked"
        );

        run.advance(IngestStage::Embedding);
        let chunks = match self.embed_chunks(chunks).await {
            Ok(chunks) => chunks,
            Err(e) => return Err(self.failed(&mut run, e)),
        };

        run.advance(IngestStage::CheckingDuplicate);
        let skip_reason = match self.duplicate_reason(&document.content_hash).await {
            Ok(reason) => reason,
            Err(e) => return Err(self.failed(&mut run, e)),
        };

        if let Some(reason) = skip_reason {
            run.advance(IngestStage::Done);
            tracing::warn!(filename = %document.filename, "{}; skipping ingestion", reason);
            return Ok(IngestReport {
                document,
                outcome: IngestOutcome::Skipped { reason },
                elapsed_ms: run.elapsed_ms(),
                stages: run.visited,
            });
        }

        run.advance(IngestStage::Inserting);
        if let Err(e) = self.store.insert(&document, &chunks).await {
            return Err(self.failed(&mut run, e));
        }

        run.advance(IngestStage::Done);
        tracing::info!(
            filename = %document.filename,
            pages = document.page_count,
            chunks = chunks.len(),
            elapsed_ms = run.elapsed_ms(),
            "Document indexed"
        );

        Ok(IngestReport {
            document,
            outcome: IngestOutcome::Indexed {
                chunks: chunks.len(),
            },
            elapsed_ms: run.elapsed_ms(),
            stages: run.visited,
        })
    }

    fn failed(&self, run: &mut IngestRun, err: Error) -> Error {
        let err = run.fail(err);
        tracing::error!(error = %err, "Ingestion failed");
        err
    }

    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<Chunk>> {
        let dimensions = self.embedder.dimensions();
        let mut embedded = Vec::with_capacity(chunks.len());
        let mut pending = chunks.into_iter().peekable();

        while pending.peek().is_some() {
            let batch: Vec<Chunk> = pending.by_ref().take(EMBED_BATCH_SIZE).collect();
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();

            let vectors = tokio::time::timeout(self.embed_timeout, self.embedder.embed_batch(&texts))
                .await
                .map_err(|_| Error::timeout("embedding", self.embed_timeout.as_secs()))??;

            if vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} vectors for {} texts",
                    self.embedder.name(),
                    vectors.len(),
                    batch.len()
                )));
            }

            for (chunk, vector) in batch.into_iter().zip(vectors) {
                if vector.len() != dimensions {
                    return Err(Error::embedding(format!(
                        "{} returned {} dimensions, expected {}",
                        self.embedder.name(),
                        vector.len(),
                        dimensions
                    )));
                }
                embedded.push(chunk.with_embedding(vector));
            }
        }

        Ok(embedded)
    }

    async fn duplicate_reason(&self, content_hash: &str) -> Result<Option<String>> {
        if let DedupPolicy::StoreNonEmpty = self.dedup {
            let count = self.store.count().await?;
            if count > 0 {
                return Ok(Some(format!("Vector store already holds {} entries", count)));
            }
        }

        // a registered document without entries still owns its hash
        Ok(self
            .store
            .contains_hash(content_hash)
            .await?
            .then(|| "Document with identical content is already indexed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        fn dimensions(&self) -> usize {
            3
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(IngestStage::CheckingDuplicate.to_string(), "checking_duplicate");
        assert_eq!(IngestStage::Inserting.to_string(), "inserting");
        assert!(IngestStage::Failed.is_terminal());
        assert!(!IngestStage::Embedding.is_terminal());
    }

    #[test]
    fn test_run_failure_records_stage() {
        let mut run = IngestRun::start();
        run.advance(IngestStage::Loading);
        let err = run.fail(Error::load("x.pdf", "missing"));
        assert_eq!(
            run.visited,
            vec![IngestStage::Idle, IngestStage::Loading, IngestStage::Failed]
        );
        assert!(matches!(err, Error::Ingest { stage: IngestStage::Loading, .. }));
    }

    #[tokio::test]
    async fn test_wrong_dimension_fails_embedding_stage() {
        use crate::providers::LocalVectorStore;
        use crate::storage::SqliteVectorStore;
        use crate::types::{Document, Page};

        let store = Arc::new(LocalVectorStore::new(Arc::new(SqliteVectorStore::in_memory().unwrap())));
        let pipeline = IngestPipeline::new(
            TextChunker::new(100, 10).unwrap(),
            Arc::new(BrokenEmbedder),
            store.clone(),
            DedupPolicy::ContentHash,
            Duration::from_secs(5),
        );

        let document = Document::new("menu.pdf", b"bytes", 1);
        let pages = vec![Page {
            document_id: document.id,
            filename: "menu.pdf".to_string(),
            number: 1,
            text: "Soup $5".to_string(),
        }];

        let err = pipeline
            .process_loaded(IngestRun::start(), LoadedPdf { document, pages })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Ingest { stage: IngestStage::Embedding, .. }));
        assert!(matches!(err.root(), Error::Embedding(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
