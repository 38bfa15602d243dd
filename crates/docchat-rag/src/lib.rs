//! docchat-rag: question answering over uploaded PDF documents
//!
//! PDFs are split into overlapping page windows, embedded, and appended to a
//! persistent SQLite vector index. Questions are embedded, matched against the
//! index, and answered by a generative model instructed to use only the
//! retrieved passages.

pub mod chat;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use chat::DocumentChat;
pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    Answer, Chunk, ChunkSource, Document, IngestOutcome, IngestReport, Page, ScoredChunk,
    StoreStats, FALLBACK_ANSWER,
};
