//! Error types for the client state cache.

use thiserror::Error;

use crate::service::ValidationError;

/// Boxed transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while talking to the score service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected locally before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service could not be reached. Triggers degraded mode.
    #[error("Network error: {0}")]
    Network(#[source] BoxError),

    /// The service refused the request (4xx).
    #[error("Request rejected ({status} {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    /// The service failed while handling the request (5xx).
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(#[source] BoxError),

    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Setup(#[source] BoxError),

    #[error("Local backup IO error: {0}")]
    BackupIo(#[from] std::io::Error),

    #[error("Local backup is corrupt: {0}")]
    BackupFormat(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns `true` if the service was unreachable.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns `true` if the submission itself was invalid, locally or
    /// according to the service.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::Rejected { status, .. } => *status == 400,
            _ => false,
        }
    }
}
