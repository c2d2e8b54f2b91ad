//! sheetsync Store - the shared snapshot store and its lock
//!
//! Provides:
//! - `SnapshotStore` trait and its git implementation (`GitWorkingCopy`)
//! - `TryAcquire` trait and the git ref race (`GitRefLock`)
//! - Table-file codec with atomic writes (`TableDir`)
//! - Per-host serialization of a working copy (`LocalLease`)

pub mod errors;
pub mod git;
pub mod lease;
pub mod lock;
pub mod snapshot;
pub mod table;

pub use errors::Result;
pub use git::{repo_name_from_url, GitWorkingCopy, Identity, StoreConfig};
pub use lease::LocalLease;
pub use lock::{GitRefLock, LockState, LockToken, TryAcquire};
pub use snapshot::SnapshotStore;
pub use table::TableDir;
