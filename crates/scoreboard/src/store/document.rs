//! Single-document store backed by fjall.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};
use serde::{Deserialize, Serialize};

use crate::logging::{debug, info};
use crate::model::{ScoreEntry, Scoreboard, accumulate};

use super::{AggregateStore, StoreError};

/// Keyspace holding the leaderboard document.
const SCORES_KEYSPACE: &str = "scores";

/// Key of the leaderboard document.
const LEADERBOARD_KEY: &str = "leaderboard";

/// Current document format version.
const DOCUMENT_VERSION: u32 = 1;

/// The persisted leaderboard.
///
/// `next_id` lives next to the entries so that one insert updates both,
/// and it survives `clear` so identities are never reused.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardDocument {
    version: u32,
    next_id: u64,
    scores: Vec<ScoreEntry>,
}

impl LeaderboardDocument {
    fn new() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            next_id: 1,
            scores: Vec::new(),
        }
    }
}

/// Leaderboard stored as one JSON document.
///
/// Upserts are read-modify-write cycles over the whole document. They run
/// under `write_lock`, which makes this store the single writer of its
/// document. Open at most one `DocumentStore` per directory.
pub struct DocumentStore {
    db: fjall::Database,
    scores: Keyspace,
    write_lock: Mutex<()>,
}

impl DocumentStore {
    /// Open an existing document store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotInitialized(path.display().to_string()));
        }

        let db = fjall::Database::builder(path).open()?;
        let scores = db.keyspace(SCORES_KEYSPACE, KeyspaceCreateOptions::default)?;
        let store = Self {
            db,
            scores,
            write_lock: Mutex::new(()),
        };

        // An opened store must already hold a readable document
        if store.load()?.is_none() {
            return Err(StoreError::NotInitialized(path.display().to_string()));
        }

        info!(path = %path.display(), "opened document store");
        Ok(store)
    }

    /// Initialize a new document store at the given path.
    ///
    /// An existing document is left untouched.
    pub fn init(path: &Path) -> Result<Self, StoreError> {
        let db = fjall::Database::builder(path).open()?;
        let scores = db.keyspace(SCORES_KEYSPACE, KeyspaceCreateOptions::default)?;
        let store = Self {
            db,
            scores,
            write_lock: Mutex::new(()),
        };

        if store.load()?.is_none() {
            store.save(&LeaderboardDocument::new())?;
        }

        info!(path = %path.display(), "initialized document store");
        Ok(store)
    }

    /// Open the store, initializing it when there is no document yet.
    pub fn open_or_init(path: &Path) -> Result<Self, StoreError> {
        match Self::open(path) {
            Err(StoreError::NotInitialized(_)) => Self::init(path),
            other => other,
        }
    }

    fn load(&self) -> Result<Option<LeaderboardDocument>, StoreError> {
        let Some(bytes) = self.scores.get(LEADERBOARD_KEY)? else {
            return Ok(None);
        };

        let document: LeaderboardDocument = serde_json::from_slice(bytes.as_ref())?;
        if document.version != DOCUMENT_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Document version mismatch: expected {}, got {}",
                DOCUMENT_VERSION, document.version
            )));
        }

        Ok(Some(document))
    }

    fn save(&self, document: &LeaderboardDocument) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(document)?;
        self.scores.insert(LEADERBOARD_KEY, bytes.as_slice())?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    /// Run a read-modify-write cycle as the only writer.
    fn modify<F>(&self, f: F) -> Result<Scoreboard, StoreError>
    where
        F: FnOnce(&mut LeaderboardDocument) -> Result<(), StoreError>,
    {
        // The guarded data is `()`, so a poisoned lock carries no broken state
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut document = self.load()?.unwrap_or_else(LeaderboardDocument::new);
        f(&mut document)?;
        self.save(&document)?;

        Ok(Scoreboard::from_entries(document.scores))
    }
}

impl AggregateStore for DocumentStore {
    async fn get(&self) -> Result<Scoreboard, StoreError> {
        let document = self.load()?.unwrap_or_else(LeaderboardDocument::new);
        Ok(Scoreboard::from_entries(document.scores))
    }

    async fn upsert(&self, name: &str, delta: u64) -> Result<Scoreboard, StoreError> {
        debug!(name, delta, "upserting score");
        self.modify(|document| {
            let now = Utc::now();
            if accumulate(&mut document.scores, name, delta, document.next_id, now)? {
                document.next_id = document.next_id.saturating_add(1);
            }
            Ok(())
        })
    }

    async fn clear(&self) -> Result<Scoreboard, StoreError> {
        info!("clearing document store");
        self.modify(|document| {
            document.scores.clear();
            Ok(())
        })
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}
