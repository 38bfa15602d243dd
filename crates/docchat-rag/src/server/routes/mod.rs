//! API routes for the document chat server

pub mod documents;
pub mod query;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload with larger body limit for PDFs
        .route(
            "/documents",
            post(documents::upload_document)
                .get(documents::list_documents)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/query", post(query::ask))
        .route("/stats", get(documents::stats))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    let config = state.chat().config();
    Json(json!({
        "name": "docchat-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over uploaded PDF documents",
        "uptime_secs": state.uptime_secs(),
        "embedder": state.chat().embedder_name(),
        "llm": {
            "provider": state.chat().llm_name(),
            "model": state.chat().llm_model(),
        },
        "chunking": {
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
        },
        "retrieval": {
            "top_k": config.retrieval.top_k,
            "min_similarity": config.retrieval.min_similarity,
        },
        "dedup": config.ingestion.dedup,
        "endpoints": {
            "POST /api/documents": "Upload a PDF (multipart field 'file') and index it",
            "GET /api/documents": "List indexed documents",
            "POST /api/query": "Ask a question: {\"question\": \"...\"}",
            "GET /api/stats": "Index statistics",
            "GET /api/info": "This document",
        }
    }))
}
