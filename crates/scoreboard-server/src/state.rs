//! Application state management.

use std::sync::Arc;

use scoreboard::{Backend, ScoreService, ServiceError, StoreError};
use thiserror::Error;

use super::config::Config;

/// Shared application state: one long-lived score service.
#[derive(Clone)]
pub struct AppState {
    service: Arc<ScoreService<Backend>>,
}

impl AppState {
    /// Open the configured store and wrap it in a service.
    pub async fn from_config(config: &Config) -> Result<Self, StateError> {
        let backend = Backend::open(&config.store.backend_config())
            .await
            .map_err(|source| StateError::OpenStore {
                backend: format!("{:?}", config.store.backend).to_lowercase(),
                source,
            })?;

        tracing::info!(backend = backend.kind(), "aggregate store ready");
        Ok(Self::new(ScoreService::new(backend)))
    }

    /// Wrap an already constructed service.
    pub fn new(service: ScoreService<Backend>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// The score service.
    pub fn service(&self) -> &ScoreService<Backend> {
        &self.service
    }

    /// Flush and close the store. Call once, after the server stopped.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.service.close().await
    }
}

/// Errors that can occur when setting up application state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to open {backend} store: {source}")]
    OpenStore {
        backend: String,
        #[source]
        source: StoreError,
    },
}
