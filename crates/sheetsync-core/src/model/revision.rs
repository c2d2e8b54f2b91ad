//! Published revision of the shared store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One published, atomic state of the shared store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Commit id (full hex)
    pub id: String,
    /// Commit timestamp, second precision
    pub committed_at: DateTime<Utc>,
}

impl Revision {
    pub fn new(id: impl Into<String>, committed_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            committed_at,
        }
    }

    /// Abbreviated id for log lines
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(12)]
    }

    /// Age of the revision at `now`; zero when the commit clock is ahead of ours
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.committed_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// True when the revision is strictly younger than `window`
    pub fn is_fresh(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) < window
    }
}
