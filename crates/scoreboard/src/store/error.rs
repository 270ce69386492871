//! Error types for the aggregate stores.

use thiserror::Error;

use crate::service::ValidationError;

/// Errors that can occur while reading or writing an aggregate store.
///
/// Apart from [`StoreError::Rejected`], every variant means the store could
/// not serve the request.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store is fine but refuses this write, e.g. a total that would
    /// exceed [`crate::MAX_COUNT`]. Nothing was changed.
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "document")]
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[cfg(feature = "relational")]
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Store not initialized at {0}")]
    NotInitialized(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
