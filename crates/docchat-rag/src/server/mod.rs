//! HTTP server for the document chat system

pub mod routes;
pub mod state;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::chat::DocumentChat;
use crate::config::RagConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Document chat HTTP server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server from config, building providers and opening the index
    pub async fn new(config: RagConfig) -> Result<Self> {
        let chat = DocumentChat::from_config(config.clone()).await?;
        Ok(Self::with_chat(chat))
    }

    /// Create a server around an assembled facade
    pub fn with_chat(chat: DocumentChat) -> Self {
        Self {
            config: chat.config().clone(),
            state: AppState::new(chat),
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .nest("/api", routes::api_routes(self.config.server.max_upload_size))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.server.enable_cors {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting document chat server on http://{}", addr);
        tracing::info!("API documentation: http://{}/api/info", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness: index readable and model backends reachable
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let index = state.chat().stats().await;
    let providers = state.chat().health().await;
    let ready = index.is_ok() && providers.embedder && providers.llm;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "ready": ready,
            "index": index.is_ok(),
            "embedder": providers.embedder,
            "llm": providers.llm,
        })),
    )
}
