//! Storage module for the persistent vector index
//!
//! Provides SQLite-based persistence for documents and embedded chunks.

mod vector_store;

pub use vector_store::{SqliteVectorStore, INDEX_FILE_NAME};
