//! Error types for the document chat system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingestion::IngestStage;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing, unreadable or invalid PDF
    #[error("Failed to load '{path}': {message}")]
    Load { path: String, message: String },

    /// Malformed chunking input or parameters
    #[error("Chunking failed: {0}")]
    Chunk(String),

    /// Embedding model unavailable or malformed output
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index could not be written
    #[error("Vector store write failed: {0}")]
    StoreWrite(String),

    /// Vector index could not be read or is corrupted
    #[error("Vector store read failed: {0}")]
    StoreRead(String),

    /// Generation model failure
    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    /// External model call exceeded its deadline
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Ingestion pipeline failure, tagged with the stage it failed in
    #[error("Ingestion failed during {stage}: {source}")]
    Ingest {
        stage: IngestStage,
        #[source]
        source: Box<Error>,
    },

    /// Query pipeline failure
    #[error("Query failed: {source}")]
    Query {
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a load error
    pub fn load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a store write error
    pub fn store_write(message: impl Into<String>) -> Self {
        Self::StoreWrite(message.into())
    }

    /// Create a store read error
    pub fn store_read(message: impl Into<String>) -> Self {
        Self::StoreRead(message.into())
    }

    /// Create a synthesis error
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis(message.into())
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wrap an error as an ingestion failure at `stage`
    pub fn ingest(stage: IngestStage, source: Error) -> Self {
        Self::Ingest {
            stage,
            source: Box::new(source),
        }
    }

    /// Wrap an error as a query failure
    pub fn query(source: Error) -> Self {
        Self::Query {
            source: Box::new(source),
        }
    }

    /// Innermost error, looking through the pipeline wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::Ingest { source, .. } | Error::Query { source } => source.root(),
            other => other,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.root() {
            Error::Config(_) | Error::Load { .. } | Error::Chunk(_) => StatusCode::BAD_REQUEST,
            Error::Embedding(_) | Error::Synthesis(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Load { .. } => "load_error",
            Error::Chunk(_) => "chunk_error",
            Error::Embedding(_) => "embedding_error",
            Error::StoreWrite(_) => "store_write_error",
            Error::StoreRead(_) => "store_read_error",
            Error::Synthesis(_) => "synthesis_error",
            Error::Timeout { .. } => "timeout_error",
            Error::Ingest { .. } => "ingest_error",
            Error::Query { .. } => "query_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "type": self.error_type(),
                "cause": self.root().error_type(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
