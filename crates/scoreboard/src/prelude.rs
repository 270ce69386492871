//! Convenient re-exports for common usage patterns.
//!
//! ```ignore
//! use scoreboard::prelude::*;
//!
//! let service = ScoreService::new(DocumentStore::open_or_init(Path::new(".scoreboard"))?);
//! service.add_score("Bob", 15).await?;
//! ```

pub use std::path::Path;

// Unified error handling
pub use crate::error::{Error, Result};

// Data model and service
pub use crate::model::{RankedEntry, ScoreEntry, Scoreboard};
pub use crate::service::{ScoreService, ServiceError, ValidationError};
pub use crate::stats::Stats;
pub use crate::store::{AggregateStore, StoreError};

// Store backends (requires "document" / "relational" features)
#[cfg(any(feature = "document", feature = "relational"))]
pub use crate::store::{Backend, BackendConfig};
#[cfg(feature = "document")]
pub use crate::store::DocumentStore;
#[cfg(feature = "relational")]
pub use crate::store::{RelationalConfig, RelationalStore};

// Client state cache (requires "client" feature)
#[cfg(feature = "client")]
pub use crate::client::{
    ClientError, ClientState, Connectivity, HttpTransport, LocalBackup, ScoreClient, Transport,
};
