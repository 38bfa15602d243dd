//! Document upload and index inspection endpoints

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::ingestion::IngestStage;
use crate::server::state::AppState;
use crate::types::{Document, IngestReport, StoreStats};

/// Multipart field carrying the PDF
const FILE_FIELD: &str = "file";

/// POST /api/documents - upload a PDF and index it
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::ingest(IngestStage::Loading, Error::load("upload", format!("Malformed multipart body: {}", e)))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let data = field.bytes().await.map_err(|e| {
            Error::ingest(IngestStage::Loading, Error::load(&filename, format!("Failed to read upload: {}", e)))
        })?;

        tracing::info!(filename = %filename, bytes = data.len(), "Received upload");
        let report = state.chat().upload_document(&filename, &data).await?;
        return Ok(Json(report));
    }

    Err(Error::ingest(
        IngestStage::Loading,
        Error::load("upload", format!("Missing multipart field '{}'", FILE_FIELD)),
    ))
}

/// GET /api/documents - list indexed documents
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<Document>>> {
    Ok(Json(state.chat().documents().await?))
}

/// GET /api/stats - index statistics
pub async fn stats(State(state): State<AppState>) -> Result<Json<StoreStats>> {
    Ok(Json(state.chat().stats().await?))
}
