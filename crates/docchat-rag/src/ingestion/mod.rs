//! Document ingestion: PDF loading, chunking and the indexing pipeline

mod chunker;
mod loader;
mod pipeline;

pub use chunker::TextChunker;
pub use loader::{normalize_text, LoadedPdf, PdfLoader};
pub use pipeline::{IngestPipeline, IngestStage};
