//! Case-insensitive score aggregation with pluggable persistence.
//!
//! Users submit a name and a count; counts accumulate per name (ignoring
//! case), and every read returns the leaderboard sorted by count together
//! with freshly computed [`Stats`].
//!
//! # Quick Start
//!
//! ```ignore
//! use scoreboard::prelude::*;
//!
//! let store = DocumentStore::open_or_init(Path::new(".scoreboard"))?;
//! let service = ScoreService::new(store);
//!
//! service.add_score("Alice", 10).await?;
//! let board = service.add_score("alice", 5).await?;
//! assert_eq!(board.find("ALICE").map(|e| e.count), Some(15));
//!
//! service.close().await?;
//! ```
//!
//! # Modules
//!
//! - [`model`] - Entries, leaderboards and ranking (always available)
//! - [`stats`] - Stats calculator (always available)
//! - [`store`] - Aggregate stores (`document`, `relational` features)
//! - [`service`] - Validation and orchestration (always available)
//! - [`client`] - Client mirror with offline fallback (`client` feature)
//!
//! # Feature Flags
//!
//! - `document` - fjall-backed single-document store (default)
//! - `relational` - sqlx/SQLite row-per-contributor store (default)
//! - `client` - HTTP client state cache (default)
//! - `logging` - Library-level tracing (consumers provide their own subscriber)

#[cfg(feature = "client")]
pub mod client;
mod error;
mod logging;
pub mod model;
pub mod prelude;
pub mod service;
pub mod stats;
pub mod store;

pub use error::{Error, Result};

pub use model::{MAX_COUNT, RankedEntry, ScoreEntry, Scoreboard, name_key, rank};
pub use service::{ScoreService, ServiceError, Submission, ValidationError};
pub use stats::Stats;
pub use store::{AggregateStore, StoreError};

#[cfg(any(feature = "document", feature = "relational"))]
pub use store::{Backend, BackendConfig};
#[cfg(feature = "document")]
pub use store::DocumentStore;
#[cfg(feature = "relational")]
pub use store::{RelationalConfig, RelationalStore};

#[cfg(feature = "client")]
pub use client::{ClientError, ClientState, Connectivity, HttpTransport, LocalBackup, ScoreClient};
