use std::sync::Arc;

use crate::config::Config;
use crate::interview::store::SessionStore;
use crate::llm_client::InferenceConnector;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Builds a per-session inference client from the candidate's API key.
    pub connector: Arc<dyn InferenceConnector>,
    pub config: Config,
}
