//! Client-side mirror of the leaderboard.
//!
//! [`ScoreClient`] keeps a copy of the entries and stats returned by the
//! service, plus a loading flag and a user-facing error message. It runs an
//! explicit two-state connectivity machine:
//!
//! - `Online`: every successful round trip lands here. The service state
//!   replaces the mirror and any local backup is deleted (offline
//!   submissions are not replayed).
//! - `Degraded`: entered when the service is unreachable. If a
//!   [`LocalBackup`] is configured, submissions are accumulated into the
//!   mirror locally and persisted to the backup; loads fall back to it.
//!
//! Every action takes `&mut self`, so one client never overlaps its own
//! requests.

mod backup;
mod error;
mod transport;

pub use backup::{BACKUP_FILE, LocalBackup};
pub use error::{BoxError, ClientError};
pub use transport::{DEFAULT_TIMEOUT, HttpTransport, Transport};

use chrono::Utc;

use crate::logging::{debug, info, warn};
use crate::model::{RankedEntry, ScoreEntry, Scoreboard, accumulate, rank};
use crate::service::Submission;
use crate::stats::Stats;

const SUBMIT_FAILED: &str = "Failed to submit score. Please try again.";
const CLEAR_FAILED: &str = "Failed to clear scores. Please try again.";

/// Whether the mirror is tracking the service or a private local copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Connectivity {
    #[default]
    Online,
    Degraded,
}

/// What the client currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    scores: Vec<ScoreEntry>,
    stats: Stats,
    loading: bool,
    error: Option<String>,
    connectivity: Connectivity,
}

impl ClientState {
    /// Mirrored entries, in the order last received or computed.
    pub fn scores(&self) -> &[ScoreEntry] {
        &self.scores
    }

    /// Stats for [`Self::scores`].
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Returns `true` while an action is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message to show the user after a failed action.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current connectivity state.
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    fn replace(&mut self, board: Scoreboard) {
        let (scores, stats) = board.into_parts();
        self.scores = scores;
        self.stats = stats;
    }
}

/// Mirror contents captured before an optimistic change.
struct Snapshot {
    scores: Vec<ScoreEntry>,
    stats: Stats,
}

impl Snapshot {
    fn take(state: &ClientState) -> Self {
        Self {
            scores: state.scores.clone(),
            stats: state.stats,
        }
    }

    /// Put the snapshot back, but only over the optimistic empty state it
    /// was taken for. Anything else means the mirror moved on meanwhile.
    fn restore_if_cleared(self, state: &mut ClientState) -> bool {
        if !state.scores.is_empty() || state.stats != Stats::ZERO {
            return false;
        }
        state.scores = self.scores;
        state.stats = self.stats;
        true
    }
}

/// Leaderboard mirror synchronized with a score service.
pub struct ScoreClient<T> {
    transport: T,
    state: ClientState,
    backup: Option<LocalBackup>,
    /// The mirror holds service or backup data, not just the initial empty state.
    loaded: bool,
}

impl<T: Transport> ScoreClient<T> {
    /// Client without offline fallback: failures are only reported.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ClientState::default(),
            backup: None,
            loaded: false,
        }
    }

    /// Enable degraded mode, persisting the local copy to `backup`.
    #[must_use]
    pub fn with_offline_fallback(mut self, backup: LocalBackup) -> Self {
        self.backup = Some(backup);
        self
    }

    /// Current mirror.
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Current connectivity state.
    pub fn connectivity(&self) -> Connectivity {
        self.state.connectivity
    }

    /// Returns `true` while an action is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    /// Ranked display projection of the mirror.
    pub fn ranked(&self) -> Vec<RankedEntry> {
        rank(&self.state.scores)
    }

    /// Dismiss the current error message.
    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    /// Load the leaderboard from the service.
    ///
    /// Load failures never set a user-facing error. When the service is
    /// unreachable and offline fallback is enabled, the mirror is loaded
    /// from the local backup if one exists (otherwise left as is) and
    /// `Ok(Degraded)` is returned.
    pub async fn fetch_scores(&mut self) -> Result<Connectivity, ClientError> {
        self.begin();
        let result = self.fetch_inner().await;
        self.state.loading = false;
        result
    }

    /// Submit a score.
    ///
    /// Returns `Ok(Online)` when the service accepted it, or `Ok(Degraded)`
    /// when it was applied to the local copy because the service was
    /// unreachable.
    pub async fn add_score(&mut self, name: &str, count: i64) -> Result<Connectivity, ClientError> {
        self.begin();
        let result = self.add_inner(name, count).await;
        self.state.loading = false;
        result
    }

    /// Clear every score, rolling the mirror back if the service fails.
    pub async fn clear_all_scores(&mut self) -> Result<(), ClientError> {
        self.begin();
        let result = self.clear_inner().await;
        self.state.loading = false;
        result
    }

    fn begin(&mut self) {
        self.state.loading = true;
        self.state.error = None;
    }

    fn go_online(&mut self, board: Scoreboard) {
        if self.state.connectivity == Connectivity::Degraded {
            info!("service reachable again, replacing local copy");
        }
        self.state.replace(board);
        self.state.connectivity = Connectivity::Online;
        self.loaded = true;

        if let Some(backup) = &self.backup {
            if let Err(e) = backup.remove() {
                warn!(error = %e, path = %backup.path().display(), "failed to remove local backup");
            }
        }
    }

    fn go_degraded(&mut self, err: &ClientError) {
        if self.state.connectivity == Connectivity::Online {
            warn!(error = %err, "service unreachable, entering degraded mode");
        }
        self.state.connectivity = Connectivity::Degraded;
    }

    async fn fetch_inner(&mut self) -> Result<Connectivity, ClientError> {
        let err = match self.transport.fetch().await {
            Ok(board) => {
                self.go_online(board);
                return Ok(Connectivity::Online);
            }
            Err(err) => err,
        };

        debug!(error = %err, "failed to fetch scores");
        if !err.is_network() {
            return Err(err);
        }

        self.go_degraded(&err);
        if self.backup.is_none() {
            return Err(err);
        }

        if let Err(e) = self.restore_backup() {
            warn!(error = %e, "ignoring unreadable local backup");
        }
        Ok(Connectivity::Degraded)
    }

    /// Replace the mirror with the local backup, if there is one.
    fn restore_backup(&mut self) -> Result<(), ClientError> {
        let Some(backup) = &self.backup else {
            return Ok(());
        };

        if let Some(entries) = backup.load()? {
            info!(entries = entries.len(), "loaded scores from local backup");
            self.state.replace(Scoreboard::from_entries(entries));
        }
        self.loaded = true;
        Ok(())
    }

    async fn add_inner(&mut self, name: &str, count: i64) -> Result<Connectivity, ClientError> {
        let submission = match Submission::new(name, count) {
            Ok(submission) => submission,
            Err(e) => {
                self.state.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let err = match self
            .transport
            .add(submission.name(), submission.count())
            .await
        {
            Ok(board) => {
                self.go_online(board);
                return Ok(Connectivity::Online);
            }
            Err(err) => err,
        };

        if err.is_network() {
            self.go_degraded(&err);
            if self.backup.is_some() {
                // Never write a mirror that has not seen the earlier backup
                if !self.loaded {
                    if let Err(e) = self.restore_backup() {
                        self.state.error = Some(SUBMIT_FAILED.to_string());
                        return Err(e);
                    }
                }
                return self.apply_locally(&submission).map(|()| Connectivity::Degraded);
            }
        }

        self.state.error = Some(if err.is_validation() {
            err.to_string()
        } else {
            SUBMIT_FAILED.to_string()
        });
        Err(err)
    }

    /// Accumulate into the mirror and persist it, as the store would.
    fn apply_locally(&mut self, submission: &Submission) -> Result<(), ClientError> {
        let mut entries = self.state.scores.clone();
        let next_id = entries
            .iter()
            .map(|e| e.id)
            .max()
            .map_or(1, |id| id.saturating_add(1));
        if let Err(e) = accumulate(
            &mut entries,
            submission.name(),
            submission.count(),
            next_id,
            Utc::now(),
        ) {
            self.state.error = Some(e.to_string());
            return Err(e.into());
        }
        let board = Scoreboard::from_entries(entries);

        if let Some(backup) = &self.backup {
            if let Err(e) = backup.save(board.scores()) {
                self.state.error = Some(SUBMIT_FAILED.to_string());
                return Err(e);
            }
        }

        info!(name = submission.name(), count = submission.count(), "score applied locally");
        self.state.replace(board);
        Ok(())
    }

    async fn clear_inner(&mut self) -> Result<(), ClientError> {
        let snapshot = Snapshot::take(&self.state);
        self.state.replace(Scoreboard::empty());

        match self.transport.clear().await {
            Ok(board) => {
                self.go_online(board);
                Ok(())
            }
            Err(err) => {
                if snapshot.restore_if_cleared(&mut self.state) {
                    warn!(error = %err, "clear failed, rolled back");
                }
                if err.is_network() {
                    self.go_degraded(&err);
                }
                self.state.error = Some(CLEAR_FAILED.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use tempfile::TempDir;

    /// In-memory service that can be switched off.
    #[derive(Default)]
    struct FakeTransport {
        down: AtomicBool,
        fail_clear: AtomicBool,
        entries: Mutex<(Vec<ScoreEntry>, u64)>,
        calls: AtomicUsize,
    }

    impl FakeTransport {
        fn set_down(&self, down: bool) {
            self.down.store(down, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(ClientError::Network("connection refused".into()));
            }
            Ok(())
        }

        fn board(&self) -> Scoreboard {
            let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Scoreboard::from_entries(guard.0.clone())
        }
    }

    impl Transport for &FakeTransport {
        async fn fetch(&self) -> Result<Scoreboard, ClientError> {
            self.check()?;
            Ok(self.board())
        }

        async fn add(&self, name: &str, count: u64) -> Result<Scoreboard, ClientError> {
            self.check()?;
            {
                let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
                let (entries, next_id) = &mut *guard;
                if accumulate(entries, name, count, *next_id + 1, Utc::now())? {
                    *next_id += 1;
                }
            }
            Ok(self.board())
        }

        async fn clear(&self) -> Result<Scoreboard, ClientError> {
            self.check()?;
            if self.fail_clear.load(Ordering::SeqCst) {
                return Err(ClientError::Service {
                    status: 500,
                    message: "Failed to clear scores".into(),
                });
            }
            self.entries.lock().unwrap_or_else(|e| e.into_inner()).0.clear();
            Ok(Scoreboard::empty())
        }
    }

    fn counts(client: &ScoreClient<&FakeTransport>) -> Vec<(String, u64)> {
        client
            .ranked()
            .into_iter()
            .map(|r| (r.entry.name, r.entry.count))
            .collect()
    }

    #[tokio::test]
    async fn test_online_flow_mirrors_service() -> anyhow::Result<()> {
        let service = FakeTransport::default();
        let mut client = ScoreClient::new(&service);

        assert_eq!(client.fetch_scores().await?, Connectivity::Online);
        assert!(client.state().scores().is_empty());

        client.add_score("Alice", 10).await?;
        client.add_score("Bob", 15).await?;
        client.add_score("alice", 5).await?;

        assert_eq!(
            counts(&client),
            [("Alice".to_string(), 15), ("Bob".to_string(), 15)]
        );
        assert_eq!(client.state().stats().total_count, 30);
        assert!(!client.is_loading());
        assert_eq!(client.state().error(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_fails_before_request() {
        let service = FakeTransport::default();
        let mut client = ScoreClient::new(&service);

        let err = client.add_score("  ", 3).await.err();
        assert!(err.as_ref().is_some_and(ClientError::is_validation));
        assert_eq!(client.state().error(), Some("Name is required"));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_without_fallback_keeps_mirror() -> anyhow::Result<()> {
        let service = FakeTransport::default();
        let mut client = ScoreClient::new(&service);
        client.add_score("Carol", 4).await?;

        service.set_down(true);
        let err = client.fetch_scores().await.err();
        assert!(err.as_ref().is_some_and(ClientError::is_network));
        assert_eq!(client.connectivity(), Connectivity::Degraded);
        assert_eq!(counts(&client), [("Carol".to_string(), 4)]);
        // Load failures stay silent
        assert_eq!(client.state().error(), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_failure_without_fallback_sets_error() {
        let service = FakeTransport::default();
        service.set_down(true);
        let mut client = ScoreClient::new(&service);

        assert!(client.add_score("Dan", 1).await.is_err());
        assert_eq!(client.state().error(), Some(SUBMIT_FAILED));
        assert!(client.state().scores().is_empty());

        client.clear_error();
        assert_eq!(client.state().error(), None);
    }

    #[tokio::test]
    async fn test_degraded_mode_accumulates_and_persists() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let service = FakeTransport::default();
        let mut client =
            ScoreClient::new(&service).with_offline_fallback(LocalBackup::in_dir(dir.path()));

        client.add_score("Alice", 10).await?;
        service.set_down(true);

        assert_eq!(client.add_score("ALICE", 2).await?, Connectivity::Degraded);
        assert_eq!(client.add_score("Eve", 7).await?, Connectivity::Degraded);

        assert_eq!(
            counts(&client),
            [("Alice".to_string(), 12), ("Eve".to_string(), 7)]
        );
        let stats = client.state().stats();
        assert_eq!((stats.total_count, stats.contributor_count), (19, 2));

        // The service never saw the offline submissions
        assert_eq!(service.board().stats().total_count, 10);

        let saved = LocalBackup::in_dir(dir.path()).load()?.unwrap_or_default();
        assert_eq!(saved.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_degraded_fetch_loads_backup() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let backup = LocalBackup::in_dir(dir.path());
        let mut earlier = Vec::new();
        accumulate(&mut earlier, "Frank", 6, 1, Utc::now())?;
        backup.save(&earlier)?;

        let service = FakeTransport::default();
        service.set_down(true);
        let mut client = ScoreClient::new(&service).with_offline_fallback(backup);

        assert_eq!(client.fetch_scores().await?, Connectivity::Degraded);
        assert_eq!(counts(&client), [("Frank".to_string(), 6)]);
        assert_eq!(client.state().stats().total_count, 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_degraded_add_before_fetch_keeps_backup() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let backup = LocalBackup::in_dir(dir.path());
        let mut earlier = Vec::new();
        accumulate(&mut earlier, "Frank", 6, 1, Utc::now())?;
        backup.save(&earlier)?;

        let service = FakeTransport::default();
        service.set_down(true);
        let mut client = ScoreClient::new(&service).with_offline_fallback(backup.clone());

        assert_eq!(client.add_score("Eve", 1).await?, Connectivity::Degraded);
        assert_eq!(
            counts(&client),
            [("Frank".to_string(), 6), ("Eve".to_string(), 1)]
        );

        let saved: Vec<_> = backup
            .load()?
            .unwrap_or_default()
            .into_iter()
            .map(|e| (e.name, e.count))
            .collect();
        assert_eq!(saved, [("Frank".to_string(), 6), ("Eve".to_string(), 1)]);

        // Ids keep increasing past the restored entries
        let eve = client.state().scores().iter().find(|e| e.name == "Eve");
        assert_eq!(eve.map(|e| e.id), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_degraded_add_keeps_unreadable_backup() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let backup = LocalBackup::in_dir(dir.path());
        std::fs::write(backup.path(), b"not json")?;

        let service = FakeTransport::default();
        service.set_down(true);
        let mut client = ScoreClient::new(&service).with_offline_fallback(backup.clone());

        assert!(client.add_score("Eve", 1).await.is_err());
        assert_eq!(client.state().error(), Some(SUBMIT_FAILED));
        assert_eq!(std::fs::read(backup.path())?, b"not json");
        Ok(())
    }

    #[tokio::test]
    async fn test_degraded_add_rejects_overflowing_total() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let service = FakeTransport::default();
        let mut client =
            ScoreClient::new(&service).with_offline_fallback(LocalBackup::in_dir(dir.path()));

        client.fetch_scores().await?;
        service.set_down(true);
        client.add_score("Big", i64::MAX).await?;

        let err = client.add_score("big", 1).await.err();
        assert!(err.as_ref().is_some_and(ClientError::is_validation));
        assert!(client.state().error().is_some());
        assert_eq!(client.state().stats().total_count, crate::MAX_COUNT);
        Ok(())
    }

    #[tokio::test]
    async fn test_reconnect_replaces_and_drops_backup() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let backup = LocalBackup::in_dir(dir.path());
        let service = FakeTransport::default();
        let mut client = ScoreClient::new(&service).with_offline_fallback(backup.clone());

        client.add_score("Server", 1).await?;
        service.set_down(true);
        client.add_score("Local", 50).await?;
        assert!(backup.exists());

        service.set_down(false);
        assert_eq!(client.fetch_scores().await?, Connectivity::Online);
        assert_eq!(counts(&client), [("Server".to_string(), 1)]);
        assert!(!backup.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_success_empties_mirror_and_backup() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let backup = LocalBackup::in_dir(dir.path());
        let service = FakeTransport::default();
        let mut client = ScoreClient::new(&service).with_offline_fallback(backup.clone());
        client.add_score("Gail", 3).await?;
        backup.save(client.state().scores())?;

        client.clear_all_scores().await?;
        assert!(client.state().scores().is_empty());
        assert_eq!(client.state().stats(), Stats::ZERO);
        assert!(!backup.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_failure_rolls_back() -> anyhow::Result<()> {
        let service = FakeTransport::default();
        let mut client = ScoreClient::new(&service);
        client.add_score("Hank", 8).await?;
        client.add_score("Ivy", 2).await?;
        let before = client.state().clone();

        service.fail_clear.store(true, Ordering::SeqCst);
        assert!(client.clear_all_scores().await.is_err());

        assert_eq!(client.state().scores(), before.scores());
        assert_eq!(client.state().stats(), before.stats());
        assert_eq!(client.state().error(), Some(CLEAR_FAILED));
        assert_eq!(client.connectivity(), Connectivity::Online);
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_unreachable_rolls_back_and_degrades() -> anyhow::Result<()> {
        let service = FakeTransport::default();
        let mut client = ScoreClient::new(&service);
        client.add_score("Jo", 1).await?;

        service.set_down(true);
        assert!(client.clear_all_scores().await.is_err());
        assert_eq!(counts(&client), [("Jo".to_string(), 1)]);
        assert_eq!(client.connectivity(), Connectivity::Degraded);
        Ok(())
    }
}
