//! Row-per-contributor store backed by SQLite through sqlx.
//!
//! Queries are built at runtime rather than checked at compile time, so no
//! live database is needed to build the crate. All values are bound as
//! parameters.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::logging::{debug, info};
use crate::model::{ScoreEntry, Scoreboard, name_key};
use crate::service::ValidationError;

use super::{AggregateStore, StoreError};

/// Default maximum number of pooled connections.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a pooled connection or a database lock.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS scores (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        name         TEXT    NOT NULL,
        name_key     TEXT    NOT NULL UNIQUE,
        count        INTEGER NOT NULL CHECK (count > 0),
        created_at   TEXT    NOT NULL,
        last_updated TEXT    NOT NULL
    )";

const UPSERT: &str = "
    INSERT INTO scores (name, name_key, count, created_at, last_updated)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(name_key) DO UPDATE SET
        count = scores.count + excluded.count,
        last_updated = excluded.last_updated
    WHERE scores.count <= 9223372036854775807 - excluded.count";

const SELECT_ALL: &str = "
    SELECT id, name, count, created_at, last_updated
    FROM scores
    ORDER BY count DESC, id ASC";

/// Connection settings for the relational store.
#[derive(Debug, Clone)]
pub struct RelationalConfig {
    /// SQLite URL, e.g. `sqlite://scores.db`. The file is created if missing.
    pub url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// How long to wait for a connection or a write lock.
    pub acquire_timeout: Duration,
}

impl RelationalConfig {
    /// Create a configuration with default pool settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the acquire timeout.
    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

/// Leaderboard stored as one row per contributor.
///
/// The unique `name_key` column and `ON CONFLICT ... DO UPDATE` make each
/// increment a single atomic statement.
#[derive(Clone)]
pub struct RelationalStore {
    pool: SqlitePool,
}

impl RelationalStore {
    /// Connect and create the schema if needed.
    pub async fn connect(config: &RelationalConfig) -> Result<Self, StoreError> {
        if !config.url.starts_with("sqlite:") {
            return Err(StoreError::Config(format!(
                "Unsupported database URL '{}': expected sqlite:",
                config.url
            )));
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::Config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.acquire_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "connected to relational store"
        );

        Ok(Self { pool })
    }

    async fn fetch_board(&self) -> Result<Scoreboard, StoreError> {
        let rows = sqlx::query(SELECT_ALL).fetch_all(&self.pool).await?;
        let entries = rows
            .iter()
            .map(entry_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Scoreboard::from_entries(entries))
    }
}

fn entry_from_row(row: &SqliteRow) -> Result<ScoreEntry, StoreError> {
    let id: i64 = row.try_get("id")?;
    let count: i64 = row.try_get("count")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let last_updated: DateTime<Utc> = row.try_get("last_updated")?;

    Ok(ScoreEntry {
        id: u64::try_from(id)
            .map_err(|_| StoreError::InvalidFormat(format!("Negative id {id}")))?,
        name: row.try_get("name")?,
        count: u64::try_from(count)
            .map_err(|_| StoreError::InvalidFormat(format!("Negative count {count}")))?,
        created_at,
        last_updated,
    })
}

impl AggregateStore for RelationalStore {
    async fn get(&self) -> Result<Scoreboard, StoreError> {
        self.fetch_board().await
    }

    async fn upsert(&self, name: &str, delta: u64) -> Result<Scoreboard, StoreError> {
        let too_large = || ValidationError::TotalTooLarge(name.trim().to_string());
        let delta = i64::try_from(delta).map_err(|_| too_large())?;
        let now = Utc::now();

        debug!(name, delta, "upserting score");

        let result = sqlx::query(UPSERT)
            .bind(name.trim())
            .bind(name_key(name))
            .bind(delta)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;

        // The conflict update is skipped when the total would overflow
        if result.rows_affected() == 0 {
            return Err(too_large().into());
        }

        self.fetch_board().await
    }

    async fn clear(&self) -> Result<Scoreboard, StoreError> {
        info!("clearing relational store");
        sqlx::query("DELETE FROM scores").execute(&self.pool).await?;
        Ok(Scoreboard::empty())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::MAX_COUNT;
    use tempfile::TempDir;

    async fn temp_store() -> anyhow::Result<(TempDir, RelationalStore)> {
        let dir = TempDir::new()?;
        let url = format!("sqlite://{}", dir.path().join("scores.db").display());
        let store = RelationalStore::connect(&RelationalConfig::new(url)).await?;
        Ok((dir, store))
    }

    #[tokio::test]
    async fn test_invalid_url_is_config_error() {
        let result = RelationalStore::connect(&RelationalConfig::new("postgres://nope")).await;
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_untouched_store_is_empty() -> anyhow::Result<()> {
        let (_dir, store) = temp_store().await?;
        let board = store.get().await?;
        assert!(board.is_empty());
        assert!(board.stats().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_keeps_first_casing() -> anyhow::Result<()> {
        let (_dir, store) = temp_store().await?;
        store.upsert("Alice", 10).await?;
        let board = store.upsert("  aLiCe ", 5).await?;

        assert_eq!(board.scores().len(), 1);
        let alice = board.find("alice");
        assert_eq!(alice.map(|e| e.name.as_str()), Some("Alice"));
        assert_eq!(alice.map(|e| e.count), Some(15));
        Ok(())
    }

    #[tokio::test]
    async fn test_ties_break_by_creation() -> anyhow::Result<()> {
        let (_dir, store) = temp_store().await?;
        store.upsert("First", 5).await?;
        store.upsert("Second", 5).await?;
        let board = store.upsert("Top", 9).await?;

        let order: Vec<_> = board.scores().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(order, ["Top", "First", "Second"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_then_reuse() -> anyhow::Result<()> {
        let (_dir, store) = temp_store().await?;
        store.upsert("Dave", 3).await?;
        assert!(store.clear().await?.is_empty());
        assert!(store.get().await?.is_empty());

        let board = store.upsert("Dave", 2).await?;
        assert_eq!(board.find("dave").map(|e| e.count), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_total_above_max_count_is_rejected() -> anyhow::Result<()> {
        let (_dir, store) = temp_store().await?;
        store.upsert("Big", MAX_COUNT - 1).await?;
        let board = store.upsert("big", 1).await?;
        assert_eq!(board.find("big").map(|e| e.count), Some(MAX_COUNT));

        let result = store.upsert("BIG", 1).await;
        assert!(matches!(
            result,
            Err(StoreError::Rejected(ValidationError::TotalTooLarge(_)))
        ));

        // The row is untouched and still readable
        let board = store.get().await?;
        assert_eq!(board.find("big").map(|e| e.count), Some(MAX_COUNT));
        assert!(store.upsert("Other", MAX_COUNT + 1).await.is_err());
        assert_eq!(store.upsert("Other", 1).await?.scores().len(), 2);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_lose_nothing() -> anyhow::Result<()> {
        let (_dir, store) = temp_store().await?;
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for task in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    let name = if task % 2 == 0 { "Racer" } else { "racer" };
                    store.upsert(name, 1).await?;
                }
                Ok::<_, StoreError>(())
            }));
        }
        for handle in handles {
            handle.await??;
        }

        let board = store.get().await?;
        assert_eq!(board.scores().len(), 1);
        assert_eq!(board.stats().total_count, 80);
        Ok(())
    }
}
