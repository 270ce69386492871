//! Summary statistics derived from a leaderboard.

use serde::{Deserialize, Serialize};

use crate::model::ScoreEntry;

/// Totals across every entry of a leaderboard.
///
/// Never stored on its own: every [`Scoreboard`](crate::Scoreboard) computes
/// its stats from the entries it carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Sum of all entry counts.
    pub total_count: u64,
    /// Number of entries.
    pub contributor_count: u64,
    /// `total_count / contributor_count` rounded half up, 0 when empty.
    pub average_per_contributor: u64,
}

impl Stats {
    /// Stats of an empty leaderboard.
    pub const ZERO: Stats = Stats {
        total_count: 0,
        contributor_count: 0,
        average_per_contributor: 0,
    };

    /// Compute stats for the given entries.
    pub fn compute(entries: &[ScoreEntry]) -> Self {
        let total_count = entries
            .iter()
            .fold(0u64, |sum, entry| sum.saturating_add(entry.count));
        let contributor_count = u64::try_from(entries.len()).unwrap_or(u64::MAX);

        Self {
            total_count,
            contributor_count,
            average_per_contributor: rounded_average(total_count, contributor_count),
        }
    }

    /// Returns `true` when there are no contributors.
    pub fn is_empty(&self) -> bool {
        self.contributor_count == 0
    }
}

/// Integer division rounding halves up: `floor((2 * total + n) / (2 * n))`.
fn rounded_average(total: u64, n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let total = u128::from(total);
    let n = u128::from(n);
    let avg = (total * 2 + n) / (n * 2);
    u64::try_from(avg).unwrap_or(u64::MAX)
}
