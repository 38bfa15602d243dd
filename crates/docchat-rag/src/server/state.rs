//! Application state for the HTTP server

use std::sync::Arc;
use std::time::Instant;

use crate::chat::DocumentChat;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    chat: DocumentChat,
    started_at: Instant,
}

impl AppState {
    pub fn new(chat: DocumentChat) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                chat,
                started_at: Instant::now(),
            }),
        }
    }

    /// The document chat facade
    pub fn chat(&self) -> &DocumentChat {
        &self.inner.chat
    }

    /// Seconds since the server started
    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
