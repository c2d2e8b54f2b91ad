//! sheetsync Core - error and logging facilities plus the cache data model
//!
//! This crate provides the pieces shared by the store, the engine and the
//! CLI:
//! - Structured error facility (`ExError`, stable codes, visible/internal class)
//! - Logging facility (init profiles, boundary macros, test capture)
//! - Table, record and revision models, snapshot manifests
//! - Wait and lock-round policy

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod policy;

/// Re-exported so the logging macros can name schema constants from any crate
pub use sheetsync_core_types as core_types;

pub use errors::{ErrorClass, ExError, ExErrorKind, Result, SheetSyncError};
pub use model::{Record, Revision, SnapshotManifest, Table, TableEntry};
pub use policy::{SyncPolicy, WaitPolicy};
