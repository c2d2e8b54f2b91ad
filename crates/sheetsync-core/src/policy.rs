//! Timing policy for the sync protocol
//!
//! These are fixed policy values, not caller configuration: every process
//! contending for the same cache must agree on them. They are still named
//! values rather than literals so tests can shrink them.

use std::time::Duration;

/// Pause between two polls of the shared store while waiting
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Maximum age of the published revision that ends a wait
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(300);

/// Polls before the waiter gives up
pub const DEFAULT_MAX_WAIT_ATTEMPTS: u32 = 60;

/// Granularity of lock rounds; all contenders inside one round race for
/// the same lock ref
pub const DEFAULT_LOCK_ROUND: Duration = Duration::from_secs(60);

/// Bounded polling policy of the waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    pub freshness_window: Duration,
    pub max_attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            max_attempts: DEFAULT_MAX_WAIT_ATTEMPTS,
        }
    }
}

impl WaitPolicy {
    /// Upper bound on time spent sleeping before a timeout
    pub fn max_wait(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }

    /// Polls needed to observe a revision that is `staleness` behind the
    /// start of the wait, capped by the budget
    pub fn expected_attempts(&self, staleness: Duration) -> u32 {
        if self.poll_interval.is_zero() {
            return 1.min(self.max_attempts);
        }
        let polls = staleness.as_nanos().div_ceil(self.poll_interval.as_nanos());
        u32::try_from(polls)
            .unwrap_or(u32::MAX)
            .clamp(1, self.max_attempts.max(1))
    }
}

/// Everything the sync state machine needs to know about timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    pub wait: WaitPolicy,
    pub lock_round: Duration,
    /// Delete the round's remote lock ref after a successful refresh
    pub prune_lock_refs: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            wait: WaitPolicy::default(),
            lock_round: DEFAULT_LOCK_ROUND,
            prune_lock_refs: false,
        }
    }
}
