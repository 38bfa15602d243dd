//! Answer and report types returned by the pipelines

use serde::{Deserialize, Serialize};

use super::document::{Chunk, Document};
use crate::ingestion::IngestStage;

/// Sentence returned when the documents do not contain the answer
pub const FALLBACK_ANSWER: &str = "I don't have this information in the provided documents.";

/// A stored chunk together with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query vector
    pub score: f32,
}

/// Answer to a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text, unmodified model output
    pub text: String,
    /// Chunks given to the model as context, in retrieval order
    pub sources: Vec<ScoredChunk>,
    /// True when the fallback sentence was returned without calling the model
    pub is_fallback: bool,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl Answer {
    /// The fixed "not in the documents" answer
    pub fn fallback(processing_time_ms: u64) -> Self {
        Self {
            text: FALLBACK_ANSWER.to_string(),
            sources: Vec::new(),
            is_fallback: true,
            processing_time_ms,
        }
    }
}

/// Result of an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Chunks were appended to the index
    Indexed { chunks: usize },
    /// The duplicate guard skipped the document
    Skipped { reason: String },
}

/// Summary of one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// The processed document
    pub document: Document,
    /// What happened to it
    pub outcome: IngestOutcome,
    /// Stages visited, in order
    pub stages: Vec<IngestStage>,
    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,
}

impl IngestReport {
    /// Whether the document was appended to the index
    pub fn was_indexed(&self) -> bool {
        matches!(self.outcome, IngestOutcome::Indexed { .. })
    }
}

/// Index statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of stored entries
    pub entries: usize,
    /// Number of registered documents
    pub documents: usize,
    /// Vector dimension, fixed by the first insert
    pub dimension: Option<usize>,
}
