//! Question answering endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::Answer;

/// Question request
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// A context passage shown with the answer
#[derive(Debug, Clone, Serialize)]
pub struct SourceSnippet {
    pub filename: String,
    pub page_number: u32,
    pub score: f32,
    pub snippet: String,
}

/// Answer response
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub is_fallback: bool,
    pub sources: Vec<SourceSnippet>,
    pub processing_time_ms: u64,
}

impl From<Answer> for QueryResponse {
    fn from(answer: Answer) -> Self {
        Self {
            sources: answer
                .sources
                .into_iter()
                .map(|s| SourceSnippet {
                    filename: s.chunk.source.filename,
                    page_number: s.chunk.source.page_number,
                    score: s.score,
                    snippet: s.chunk.content,
                })
                .collect(),
            answer: answer.text,
            is_fallback: answer.is_fallback,
            processing_time_ms: answer.processing_time_ms,
        }
    }
}

/// POST /api/query - answer a question from the indexed documents
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    tracing::info!("Query: \"{}\"", request.question);
    let answer = state.chat().answer_question(&request.question).await?;
    Ok(Json(answer.into()))
}
