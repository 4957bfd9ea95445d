//! Reindex request settings.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of newest entries reindexed by [`ReindexSettings::newest`].
pub const NEWEST_ENTRIES_LIMIT: usize = 1000;

/// Scope of a reindex run.
///
/// Neither field set means a full reindex. When both are set, `from_date`
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexSettings {
    /// Only rows modified after this instant
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,

    /// Only the N rows with the highest order key
    #[serde(default)]
    pub last_n_entries: Option<usize>,
}

impl ReindexSettings {
    /// Full reindex.
    pub fn full() -> Self {
        Self::default()
    }

    /// Entries modified since the start of yesterday (UTC), 1,000 newest at
    /// maximum.
    pub fn newest() -> Self {
        Self::newest_at(Utc::now())
    }

    /// [`ReindexSettings::newest`] relative to a given instant.
    pub fn newest_at(now: DateTime<Utc>) -> Self {
        let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        Self {
            from_date: Some(today - Duration::days(1)),
            last_n_entries: Some(NEWEST_ENTRIES_LIMIT),
        }
    }

    pub fn since(from_date: DateTime<Utc>) -> Self {
        Self {
            from_date: Some(from_date),
            last_n_entries: None,
        }
    }

    pub fn last(n: usize) -> Self {
        Self {
            from_date: None,
            last_n_entries: Some(n),
        }
    }

    /// True if only a part of the table is reindexed.
    pub fn is_partial(&self) -> bool {
        self.from_date.is_some() || self.last_n_entries.is_some()
    }
}
