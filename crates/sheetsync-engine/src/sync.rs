//! The sync state machine
//!
//! ```text
//! Acquiring --won--> Held ----refresh published----> Fresh
//!     \
//!      --lost--> Waiting --fresh revision seen--> Fresh
//!                        \--budget exhausted----> TimedOut
//! ```
//!
//! The lock decides only who refreshes this round. Losers never refresh;
//! they poll until the winner's publish arrives or their budget runs out.

use crate::clock::{Clock, SystemClock};
use crate::refresh::{refresh, RefreshReport};
use crate::source::DatasetSource;
use crate::waiter::{wait_for_fresh, WaitReport};
use crate::Result;
use sheetsync_core::core_types::SyncId;
use sheetsync_core::{log_op_end, log_op_error, log_op_start};
use sheetsync_core::{ExErrorKind, Revision, SyncPolicy};
use sheetsync_store::{SnapshotStore, TryAcquire};
use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Acquiring,
    Held,
    Waiting,
    Fresh,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// This caller held the lock and published a new snapshot
    Refreshed(RefreshReport),
    /// Another caller refreshed; this one observed the result
    Waited(WaitReport),
}

impl SyncOutcome {
    pub fn revision(&self) -> &Revision {
        match self {
            SyncOutcome::Refreshed(report) => &report.revision,
            SyncOutcome::Waited(report) => &report.revision,
        }
    }

    pub fn refreshed(&self) -> bool {
        matches!(self, SyncOutcome::Refreshed(_))
    }
}

pub struct Syncer<S, L, D, C = SystemClock> {
    store: S,
    lock: L,
    source: D,
    dataset_url: String,
    policy: SyncPolicy,
    clock: C,
    phase: Cell<Option<SyncPhase>>,
}

impl<S, L, D> Syncer<S, L, D, SystemClock> {
    pub fn new(store: S, lock: L, source: D, dataset_url: impl Into<String>, policy: SyncPolicy) -> Self {
        Self {
            store,
            lock,
            source,
            dataset_url: dataset_url.into(),
            policy,
            clock: SystemClock,
            phase: Cell::new(None),
        }
    }
}

impl<S, L, D, C> Syncer<S, L, D, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Syncer<S, L, D, C2> {
        Syncer {
            store: self.store,
            lock: self.lock,
            source: self.source,
            dataset_url: self.dataset_url,
            policy: self.policy,
            clock,
            phase: self.phase,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    pub fn dataset_url(&self) -> &str {
        &self.dataset_url
    }

    /// Phase reached by the last `sync()`, `None` before the first one
    pub fn phase(&self) -> Option<SyncPhase> {
        self.phase.get()
    }
}

impl<S, L, D, C> Syncer<S, L, D, C>
where
    S: SnapshotStore,
    L: TryAcquire,
    D: DatasetSource,
    C: Clock,
{
    /// Make the local snapshot fresh: refresh it under the lock, or wait
    /// for whoever holds the lock to publish
    ///
    /// ## Errors
    ///
    /// Refresh failures of the holder, pull failures, and the user-visible
    /// `RefreshTimedOut` when waiting exhausts its budget.
    pub fn sync(&self) -> Result<SyncOutcome> {
        let sync_id = SyncId::new();
        log_op_start!("sync", sync_id = sync_id.as_str());
        let start = std::time::Instant::now();

        let outcome = self.sync_impl().map_err(|e| {
            let e = e.with_sync_id(sync_id.clone());
            log_op_error!(
                "sync",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                sync_id = sync_id.as_str()
            );
            e
        })?;

        log_op_end!(
            "sync",
            duration_ms = start.elapsed().as_millis() as u64,
            sync_id = sync_id.as_str(),
            refreshed = outcome.refreshed(),
            revision = outcome.revision().short_id()
        );
        Ok(outcome)
    }

    fn transition(&self, next: SyncPhase) {
        tracing::debug!(from = ?self.phase.get(), to = ?next, "Sync phase");
        self.phase.set(Some(next));
    }

    fn sync_impl(&self) -> Result<SyncOutcome> {
        self.transition(SyncPhase::Acquiring);

        if self.lock.try_acquire()? {
            self.transition(SyncPhase::Held);
            let refreshed = refresh(&self.store, &self.source, &self.dataset_url);
            if let Err(e) = self.lock.release() {
                tracing::warn!(error = %e, "Releasing the lock failed");
            }
            let report = refreshed?;
            self.transition(SyncPhase::Fresh);
            return Ok(SyncOutcome::Refreshed(report));
        }

        self.transition(SyncPhase::Waiting);
        match wait_for_fresh(&self.store, &self.policy.wait, &self.clock) {
            Ok(report) => {
                self.transition(SyncPhase::Fresh);
                Ok(SyncOutcome::Waited(report))
            }
            Err(e) => {
                if e.kind() == ExErrorKind::Timeout {
                    self.transition(SyncPhase::TimedOut);
                }
                Err(e)
            }
        }
    }
}
