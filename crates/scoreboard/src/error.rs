//! Unified error type for the scoreboard library.
//!
//! Each module has its own error enum; [`Error`] wraps all of them so
//! application code can use a single `Result` type.

use thiserror::Error;

#[cfg(feature = "client")]
use crate::client::ClientError;
use crate::service::{ServiceError, ValidationError};
use crate::store::StoreError;

/// Unified error type for all scoreboard operations.
///
/// # Example
///
/// ```ignore
/// use scoreboard::{Result, ScoreService};
/// use scoreboard::store::DocumentStore;
///
/// async fn seed(path: &std::path::Path) -> Result<()> {
///     let service = ScoreService::new(DocumentStore::open_or_init(path)?);
///     service.add_score("Alice", 10).await?;
///     service.close().await?;
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A submission was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The aggregate store failed.
    #[error(transparent)]
    Store(StoreError),

    /// Talking to the service failed.
    #[cfg(feature = "client")]
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(e) => Self::Validation(e),
            other => Self::Store(other),
        }
    }
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => Self::Validation(e),
            ServiceError::StoreUnavailable(e) => Self::Store(e),
        }
    }
}

impl Error {
    /// Returns `true` if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` if this is a store error.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns `true` if this is a client error.
    #[cfg(feature = "client")]
    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client(_))
    }
}
