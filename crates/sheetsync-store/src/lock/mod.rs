//! Cross-host mutual exclusion for refreshing the shared cache
//!
//! Contenders race to create the same lock ref on the remote. Ref creation
//! is atomic on the remote side, so exactly one push per round succeeds and
//! every other contender sees a rejection.

mod git_ref;

pub use git_ref::GitRefLock;

use crate::errors::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;
use uuid::Uuid;

/// A one-shot attempt to become the refresher
pub trait TryAcquire {
    /// Returns true when this caller won the lock. Never blocks waiting for
    /// a holder. On return, local state is back to the published snapshot
    /// whatever the outcome.
    fn try_acquire(&self) -> Result<bool>;

    /// Give up a held lock after the refresh
    fn release(&self) -> Result<()> {
        Ok(())
    }
}

/// Identity of one acquisition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    /// Remote ref name shared by every contender of the round
    pub name: String,
    /// Distinguishes this attempt's marker commit from other contenders'
    pub nonce: String,
}

impl LockToken {
    pub fn for_round(now: DateTime<Utc>, round: Duration) -> Self {
        Self {
            name: round_name(now, round),
            nonce: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn marker_message(&self) -> String {
        format!("{} {}", self.name, self.nonce)
    }
}

/// Where this process stands with respect to the lock
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Held(LockToken),
}

/// Name of the lock ref for the round containing `now`
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sheetsync_store::lock::round_name;
/// use std::time::Duration;
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 7, 42).unwrap();
/// assert_eq!(round_name(now, Duration::from_secs(60)), "lock-2024-03-09-140700");
/// ```
pub fn round_name(now: DateTime<Utc>, round: Duration) -> String {
    let secs = i64::try_from(round.as_secs()).unwrap_or(i64::MAX).max(1);
    let start = now.timestamp().div_euclid(secs) * secs;
    let start = Utc.timestamp_opt(start, 0).single().unwrap_or(now);
    format!("lock-{}", start.format("%Y-%m-%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
    }

    #[test]
    fn test_same_round_same_name() {
        let round = Duration::from_secs(60);
        assert_eq!(round_name(at(14, 7, 0), round), round_name(at(14, 7, 59), round));
        assert_ne!(round_name(at(14, 7, 59), round), round_name(at(14, 8, 0), round));
    }

    #[test]
    fn test_sub_minute_rounds() {
        let round = Duration::from_secs(10);
        assert_eq!(round_name(at(14, 7, 19), round), "lock-2024-03-09-140710");
        assert_eq!(round_name(at(14, 7, 20), round), "lock-2024-03-09-140720");
    }

    #[test]
    fn test_zero_round_is_per_second() {
        assert_eq!(round_name(at(14, 7, 19), Duration::ZERO), "lock-2024-03-09-140719");
    }

    #[test]
    fn test_tokens_differ_only_by_nonce() {
        let a = LockToken::for_round(at(9, 0, 1), Duration::from_secs(60));
        let b = LockToken::for_round(at(9, 0, 30), Duration::from_secs(60));
        assert_eq!(a.name, b.name);
        assert_ne!(a.nonce, b.nonce);
        assert!(a.marker_message().starts_with("lock-2024-03-09-090000 "));
    }

    #[test]
    fn test_default_state_is_unlocked() {
        assert_eq!(LockState::default(), LockState::Unlocked);
    }
}
