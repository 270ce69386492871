//! Aggregate stores: the durable name → count mapping.
//!
//! Two backends implement [`AggregateStore`]:
//!
//! - [`DocumentStore`] keeps the whole leaderboard as one JSON document in
//!   a fjall keyspace and serializes writers behind a lock.
//! - [`RelationalStore`] keeps one SQLite row per contributor and relies on
//!   a unique name key plus `ON CONFLICT` to increment atomically.
//!
//! [`Backend`] picks one of them at runtime.

#[cfg(feature = "document")]
mod document;
mod error;
#[cfg(feature = "relational")]
mod relational;

use std::future::Future;

pub use error::StoreError;

#[cfg(feature = "document")]
pub use document::DocumentStore;
#[cfg(feature = "relational")]
pub use relational::{RelationalConfig, RelationalStore};

use crate::model::Scoreboard;

/// Durable storage for accumulated scores.
///
/// Every operation returns the full leaderboard as it stands after the
/// operation, ordered by count descending then creation order.
pub trait AggregateStore: Send + Sync {
    /// Read the current leaderboard. An untouched store is empty.
    fn get(&self) -> impl Future<Output = Result<Scoreboard, StoreError>> + Send;

    /// Add `delta` to the entry whose name matches case-insensitively, or
    /// create it with `name` as its display name.
    ///
    /// Two concurrent upserts for the same name must both be counted.
    fn upsert(
        &self,
        name: &str,
        delta: u64,
    ) -> impl Future<Output = Result<Scoreboard, StoreError>> + Send;

    /// Remove every entry. Irreversible.
    fn clear(&self) -> impl Future<Output = Result<Scoreboard, StoreError>> + Send;

    /// Flush and release the underlying resources.
    fn close(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Which backend to open, and where.
#[cfg(any(feature = "document", feature = "relational"))]
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Single-document store in the given directory.
    #[cfg(feature = "document")]
    Document { path: std::path::PathBuf },
    /// Row-per-contributor SQLite store.
    #[cfg(feature = "relational")]
    Relational(RelationalConfig),
}

/// A store chosen at runtime.
#[cfg(any(feature = "document", feature = "relational"))]
pub enum Backend {
    #[cfg(feature = "document")]
    Document(DocumentStore),
    #[cfg(feature = "relational")]
    Relational(RelationalStore),
}

#[cfg(any(feature = "document", feature = "relational"))]
impl Backend {
    /// Open (or create) the configured backend.
    pub async fn open(config: &BackendConfig) -> Result<Self, StoreError> {
        match config {
            #[cfg(feature = "document")]
            BackendConfig::Document { path } => {
                Ok(Self::Document(DocumentStore::open_or_init(path)?))
            }
            #[cfg(feature = "relational")]
            BackendConfig::Relational(config) => {
                Ok(Self::Relational(RelationalStore::connect(config).await?))
            }
        }
    }

    /// Short backend name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "document")]
            Self::Document(_) => "document",
            #[cfg(feature = "relational")]
            Self::Relational(_) => "relational",
        }
    }
}

#[cfg(any(feature = "document", feature = "relational"))]
impl AggregateStore for Backend {
    async fn get(&self) -> Result<Scoreboard, StoreError> {
        match self {
            #[cfg(feature = "document")]
            Self::Document(store) => store.get().await,
            #[cfg(feature = "relational")]
            Self::Relational(store) => store.get().await,
        }
    }

    async fn upsert(&self, name: &str, delta: u64) -> Result<Scoreboard, StoreError> {
        match self {
            #[cfg(feature = "document")]
            Self::Document(store) => store.upsert(name, delta).await,
            #[cfg(feature = "relational")]
            Self::Relational(store) => store.upsert(name, delta).await,
        }
    }

    async fn clear(&self) -> Result<Scoreboard, StoreError> {
        match self {
            #[cfg(feature = "document")]
            Self::Document(store) => store.clear().await,
            #[cfg(feature = "relational")]
            Self::Relational(store) => store.clear().await,
        }
    }

    async fn close(&self) -> Result<(), StoreError> {
        match self {
            #[cfg(feature = "document")]
            Self::Document(store) => store.close().await,
            #[cfg(feature = "relational")]
            Self::Relational(store) => store.close().await,
        }
    }
}
