//! Core types for the document chat system

pub mod document;
pub mod response;

pub use document::{Chunk, ChunkSource, Document, Page};
pub use response::{
    Answer, IngestOutcome, IngestReport, ScoredChunk, StoreStats, FALLBACK_ANSWER,
};
