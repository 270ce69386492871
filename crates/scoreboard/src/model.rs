//! Leaderboard data types and the accumulation rule shared by every backend.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::ValidationError;
use crate::stats::Stats;

/// Largest accumulated count any store can hold: SQLite integers are `i64`.
pub const MAX_COUNT: u64 = i64::MAX.unsigned_abs();

/// Accumulated score of one contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    /// Store-assigned identity. Strictly increasing in creation order.
    pub id: u64,
    /// Display name, as first submitted (trimmed).
    pub name: String,
    /// Accumulated count.
    pub count: u64,
    /// When the entry was first created.
    pub created_at: DateTime<Utc>,
    /// When the count last changed.
    pub last_updated: DateTime<Utc>,
}

impl ScoreEntry {
    /// Case-insensitive lookup key for this entry.
    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

/// Normalize a contributor name for uniqueness checks.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Store ordering: count descending, then earliest creation first.
pub fn store_order(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id))
}

/// Add `delta` to the entry matching `name` case-insensitively, or append a
/// new entry with id `next_id`.
///
/// Returns `true` when a new entry was created. The caller is responsible
/// for advancing its id sequence in that case. A total above [`MAX_COUNT`]
/// is rejected and leaves `entries` untouched.
pub fn accumulate(
    entries: &mut Vec<ScoreEntry>,
    name: &str,
    delta: u64,
    next_id: u64,
    now: DateTime<Utc>,
) -> Result<bool, ValidationError> {
    let key = name_key(name);
    let too_large = || ValidationError::TotalTooLarge(name.trim().to_string());

    if let Some(existing) = entries.iter_mut().find(|e| e.key() == key) {
        existing.count = existing
            .count
            .checked_add(delta)
            .filter(|total| *total <= MAX_COUNT)
            .ok_or_else(too_large)?;
        existing.last_updated = now;
        return Ok(false);
    }

    if delta > MAX_COUNT {
        return Err(too_large());
    }
    entries.push(ScoreEntry {
        id: next_id,
        name: name.trim().to_string(),
        count: delta,
        created_at: now,
        last_updated: now,
    });
    Ok(true)
}

/// An ordered leaderboard together with the stats computed from it.
///
/// The only way to build one is from its entries, so the stats can never
/// drift from the list they describe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    scores: Vec<ScoreEntry>,
    stats: Stats,
}

impl Scoreboard {
    /// An empty leaderboard with zeroed stats.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a leaderboard, sorting entries into store order.
    pub fn from_entries(mut scores: Vec<ScoreEntry>) -> Self {
        scores.sort_by(store_order);
        let stats = Stats::compute(&scores);
        Self { scores, stats }
    }

    /// Entries in store order.
    pub fn scores(&self) -> &[ScoreEntry] {
        &self.scores
    }

    /// Stats for [`Self::scores`].
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Returns `true` when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Look up an entry by name, ignoring case and surrounding whitespace.
    pub fn find(&self, name: &str) -> Option<&ScoreEntry> {
        let key = name_key(name);
        self.scores.iter().find(|e| e.key() == key)
    }

    /// Ranked display projection.
    pub fn ranked(&self) -> Vec<RankedEntry> {
        rank(&self.scores)
    }

    /// Split into entries and stats.
    pub fn into_parts(self) -> (Vec<ScoreEntry>, Stats) {
        (self.scores, self.stats)
    }
}

/// An entry with its 1-based display rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub entry: ScoreEntry,
}

/// Assign ranks 1..N by count descending.
///
/// Ties keep their relative input order; the store's creation-time
/// tie-break is deliberately not re-applied here.
pub fn rank(entries: &[ScoreEntry]) -> Vec<RankedEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted
        .into_iter()
        .zip(1..)
        .map(|(entry, rank)| RankedEntry { rank, entry })
        .collect()
}
