//! Lock acquisition by pushing a round-named orphan branch

use super::{LockState, LockToken, TryAcquire};
use crate::errors::Result;
use crate::git::GitWorkingCopy;
use crate::snapshot::SnapshotStore;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::time::Duration;

pub struct GitRefLock {
    copy: GitWorkingCopy,
    round: Duration,
    prune_remote: bool,
    state: RefCell<LockState>,
}

impl GitRefLock {
    pub fn new(copy: GitWorkingCopy, round: Duration) -> Self {
        Self {
            copy,
            round,
            prune_remote: false,
            state: RefCell::new(LockState::Unlocked),
        }
    }

    /// Delete the round's lock ref from the remote on release
    pub fn with_remote_pruning(mut self, prune: bool) -> Self {
        self.prune_remote = prune;
        self
    }

    pub fn state(&self) -> LockState {
        self.state.borrow().clone()
    }

    /// Attempt acquisition for the round containing `now`
    pub fn try_acquire_at(&self, now: DateTime<Utc>) -> Result<bool> {
        self.copy.pull()?;
        let token = LockToken::for_round(now, self.round);

        let attempt = self.attempt(&token);
        let cleanup = self.cleanup(&token);

        match (attempt, cleanup) {
            (Ok(acquired), Ok(())) => {
                tracing::debug!(lock_ref = %token.name, acquired, "Lock attempt finished");
                if acquired {
                    *self.state.borrow_mut() = LockState::Held(token);
                }
                Ok(acquired)
            }
            (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
            (Err(attempt_err), cleanup) => {
                if let Err(cleanup_err) = cleanup {
                    tracing::warn!(
                        lock_ref = %token.name,
                        error = %cleanup_err,
                        "Cleanup after failed lock attempt also failed"
                    );
                }
                Err(attempt_err)
            }
        }
    }

    fn attempt(&self, token: &LockToken) -> Result<bool> {
        self.copy.start_orphan(&token.name, &token.marker_message())?;
        self.copy.push_new_ref(&token.name)
    }

    fn cleanup(&self, token: &LockToken) -> Result<()> {
        self.copy.restore_published()?;
        self.copy.delete_local_branch(&token.name)
    }
}

impl TryAcquire for GitRefLock {
    fn try_acquire(&self) -> Result<bool> {
        self.try_acquire_at(Utc::now())
    }

    fn release(&self) -> Result<()> {
        let previous = self.state.replace(LockState::Unlocked);
        if let LockState::Held(token) = previous {
            if self.prune_remote {
                self.copy.delete_remote_ref(&token.name)?;
                tracing::debug!(lock_ref = %token.name, "Pruned remote lock ref");
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for GitRefLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRefLock")
            .field("dir", &self.copy.working_dir())
            .field("round", &self.round)
            .field("state", &*self.state.borrow())
            .finish()
    }
}
