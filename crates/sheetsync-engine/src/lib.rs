//! sheetsync Engine - the sync protocol and the caller-facing dataset API
//!
//! This crate wires the shared store, the lock and a dataset source into
//! one blocking `sync()`:
//! - `sync`: the `Acquiring -> Held | Waiting -> Fresh | TimedOut` machine
//! - `refresh`: fetch every sheet and publish one snapshot (lock holder)
//! - `waiter`: bounded polling for a fresh snapshot (everyone else)
//! - `reader`: key lookup and whole-table reads on the local snapshot
//! - `dataset`: `CachedDataset`, the facade callers construct from config
//! - `direct`: uncached lookup straight against the source
//!
//! ## Logging Ownership
//!
//! The engine owns lifecycle logging (`log_op_start!`, `log_op_end!`,
//! `log_op_error!`) for `sync`, `refresh`, `wait_for_fresh`, `lookup` and
//! `read_table`. Store and source code log with `tracing::debug!()` only.

pub mod clock;
pub mod config;
pub mod dataset;
pub mod direct;
pub mod reader;
pub mod refresh;
pub mod source;
pub mod sync;
pub mod waiter;

pub use clock::{Clock, SystemClock};
pub use config::DatasetConfig;
pub use dataset::CachedDataset;
pub use refresh::RefreshReport;
pub use source::{Cell, DatasetSource, Workbook};
pub use sync::{SyncOutcome, SyncPhase, Syncer};
pub use waiter::WaitReport;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, sheetsync_core::ExError>;
