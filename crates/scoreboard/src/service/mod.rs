//! The score service: validation in front of an injected aggregate store.

mod validate;

use thiserror::Error;

use crate::logging::debug;
use crate::model::Scoreboard;
use crate::store::{AggregateStore, StoreError};

pub use validate::{
    Submission, ValidationError, count_from_json, validate_count, validate_name,
};

/// Errors returned by [`ScoreService`] operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The submission was rejected before touching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store failed. The caller may retry.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(e) => Self::Validation(e),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl ServiceError {
    /// Returns `true` if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Read, add and clear scores against one long-lived store.
///
/// The store is constructed by the caller and handed over here; call
/// [`ScoreService::close`] before dropping the service to flush it.
pub struct ScoreService<S> {
    store: S,
}

impl<S: AggregateStore> ScoreService<S> {
    /// Wrap an opened store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and accumulate `count` under `name`.
    ///
    /// Repeating the same call accumulates again.
    pub async fn add_score(&self, name: &str, count: i64) -> Result<Scoreboard, ServiceError> {
        let submission = Submission::new(name, count)?;
        let board = self
            .store
            .upsert(submission.name(), submission.count())
            .await?;

        debug!(
            name = submission.name(),
            count = submission.count(),
            contributors = board.stats().contributor_count,
            "score upserted"
        );
        Ok(board)
    }

    /// Current leaderboard; empty with zeroed stats when nothing was added.
    pub async fn list_scores(&self) -> Result<Scoreboard, ServiceError> {
        let board = self.store.get().await?;
        debug!(entries = board.scores().len(), "listed scores");
        Ok(board)
    }

    /// Remove every entry.
    pub async fn clear_scores(&self) -> Result<Scoreboard, ServiceError> {
        self.store.clear().await?;
        debug!("store cleared");
        Ok(Scoreboard::empty())
    }

    /// Flush and release the store.
    pub async fn close(&self) -> Result<(), ServiceError> {
        self.store.close().await?;
        Ok(())
    }
}
