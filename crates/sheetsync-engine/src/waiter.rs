//! Waiter: bounded polling for a fresh snapshot
//!
//! Callers that lost the lock race poll the shared store until the
//! published revision is younger than the freshness window. The budget is
//! fixed; running out of it is fatal for the caller.

use crate::clock::Clock;
use crate::Result;
use sheetsync_core::{log_op_end, log_op_error, log_op_start};
use sheetsync_core::{Revision, SheetSyncError, WaitPolicy};
use sheetsync_store::SnapshotStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitReport {
    pub revision: Revision,
    /// Polls performed, counting the successful one
    pub attempts: u32,
}

/// Sleep, pull, check freshness; repeat up to `policy.max_attempts` times
///
/// ## Errors
///
/// `RefreshTimedOut` (user-visible) when the budget runs out; pull failures
/// are returned immediately.
pub fn wait_for_fresh<S, C>(store: &S, policy: &WaitPolicy, clock: &C) -> Result<WaitReport>
where
    S: SnapshotStore,
    C: Clock,
{
    log_op_start!("wait_for_fresh", max_attempts = policy.max_attempts);
    let start = std::time::Instant::now();

    let report = wait_impl(store, policy, clock).map_err(|e| {
        log_op_error!(
            "wait_for_fresh",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "wait_for_fresh",
        duration_ms = start.elapsed().as_millis() as u64,
        attempts = report.attempts,
        revision = report.revision.short_id()
    );
    Ok(report)
}

fn wait_impl<S, C>(store: &S, policy: &WaitPolicy, clock: &C) -> Result<WaitReport>
where
    S: SnapshotStore,
    C: Clock,
{
    for attempt in 1..=policy.max_attempts {
        clock.sleep(policy.poll_interval);
        store.pull()?;

        let Some(revision) = store.head_revision()? else {
            tracing::debug!(attempt, "Nothing published yet");
            continue;
        };
        let now = clock.now();
        if revision.is_fresh(policy.freshness_window, now) {
            return Ok(WaitReport {
                revision,
                attempts: attempt,
            });
        }
        tracing::debug!(
            attempt,
            age_secs = revision.age_at(now).as_secs(),
            "Published snapshot still stale"
        );
    }

    Err(SheetSyncError::RefreshTimedOut {
        attempts: policy.max_attempts,
        window_secs: policy.freshness_window.as_secs(),
    }
    .into())
}
