//! Shared application state for the Axum API server.

use std::sync::Arc;

use vigil_common::config::AppConfig;
use vigil_engine::store::AlertStore;
use vigil_push::PushTransport;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AlertStore>,
    pub push: Arc<dyn PushTransport>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn AlertStore>, push: Arc<dyn PushTransport>, config: AppConfig) -> Self {
        Self {
            store,
            push,
            config,
        }
    }
}
