//! Jarvis chat client
//!
//! A server-rendered chat page in front of a retrieval-augmented question
//! answering backend. Users type a question, the question is forwarded to the
//! backend, and the answer is shown together with the documents it cites.
//!
//! # Architecture
//!
//! - **Server**: Axum app serving the chat page, a JSON view and an SSE stream
//! - **Chat view**: pure `update`/`render` functions driven by a per-session
//!   event queue
//! - **Backend client**: one `POST /api/chat` per accepted submission
//!
//! # Modules
//!
//! - [`backend`]: HTTP client and wire types for the chat backend
//! - [`chat`]: chat state, transitions, rendering and the session store
//! - [`config`]: CLI, file and environment configuration
//! - [`session`]: per-conversation session registry
//! - [`server`]: router and handlers

pub mod backend;
pub mod chat;
pub mod config;
pub mod server;
pub mod session;

use crate::backend::{BackendError, RagClient};
use crate::config::AppConfig;

use session::SessionStore;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live chat sessions.
    pub sessions: SessionStore,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build state with a fresh session registry for `config`'s backend.
    pub fn new(config: impl Into<Arc<AppConfig>>) -> Result<Self, BackendError> {
        let config = config.into();
        let client = RagClient::new(&config.backend.base_url)?;
        Ok(Self {
            sessions: SessionStore::new(client),
            config,
        })
    }
}
