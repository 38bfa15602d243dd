//! Embed → retrieve → synthesize

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::generation::AnswerSynthesizer;
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::Answer;

use super::retriever::Retriever;

/// Answers questions from the indexed documents
#[derive(Clone)]
pub struct QueryPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    embed_timeout: Duration,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        retriever: Retriever,
        synthesizer: AnswerSynthesizer,
        embed_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            retriever,
            synthesizer,
            embed_timeout,
        }
    }

    /// Answer `question`.
    ///
    /// An empty index, a blank question or no chunk above the similarity
    /// threshold yields the fallback sentence without calling either model.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let start = Instant::now();
        let question = question.trim();

        let count = self.retriever.store().count().await.map_err(Error::query)?;
        if count == 0 || question.is_empty() {
            tracing::info!(entries = count, "Nothing to search; returning fallback answer");
            return Ok(Answer::fallback(start.elapsed().as_millis() as u64));
        }

        let vector = tokio::time::timeout(self.embed_timeout, self.embedder.embed(question))
            .await
            .map_err(|_| Error::query(Error::timeout("query embedding", self.embed_timeout.as_secs())))?
            .map_err(Error::query)?;
        if vector.len() != self.embedder.dimensions() {
            return Err(Error::query(Error::embedding(format!(
                "{} returned {} dimensions, expected {}",
                self.embedder.name(),
                vector.len(),
                self.embedder.dimensions()
            ))));
        }

        let context = self.retriever.retrieve(&vector).await.map_err(Error::query)?;
        if context.is_empty() {
            tracing::info!("No relevant context; returning fallback answer");
            return Ok(Answer::fallback(start.elapsed().as_millis() as u64));
        }

        let mut answer = self
            .synthesizer
            .synthesize(question, context)
            .await
            .map_err(Error::query)?;
        answer.processing_time_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            sources = answer.sources.len(),
            elapsed_ms = answer.processing_time_ms,
            "Question answered"
        );
        Ok(answer)
    }
}
