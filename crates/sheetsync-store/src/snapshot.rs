//! The snapshot store seam
//!
//! The engine only talks to the shared store through this trait, so the
//! protocol can be exercised against an in-memory store in tests.

use crate::errors::Result;
use sheetsync_core::Revision;
use std::path::Path;

/// A local working copy of a shared, versioned store
pub trait SnapshotStore {
    /// Bring the working copy to the latest published revision, discarding
    /// local changes. Initializes the copy on first use.
    fn pull(&self) -> Result<()>;

    /// Commit everything under the working directory as one new revision
    /// and publish it. Publishing an unchanged tree still creates a revision.
    fn publish(&self, label: &str) -> Result<Revision>;

    /// Tip of the working copy, or `None` when nothing was ever published
    fn head_revision(&self) -> Result<Option<Revision>>;

    /// Directory holding the table-files of the current snapshot
    fn working_dir(&self) -> &Path;
}
