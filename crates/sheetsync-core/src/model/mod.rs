//! Cache data model

pub mod manifest;
pub mod record;
pub mod revision;
pub mod table;

pub use manifest::{SnapshotManifest, TableEntry};
pub use record::Record;
pub use revision::Revision;
pub use table::Table;
