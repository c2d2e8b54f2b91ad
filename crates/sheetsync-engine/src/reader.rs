//! Record Reader over the local snapshot
//!
//! Reads whatever snapshot is currently checked out; callers sync first.

use crate::Result;
use sheetsync_core::Record;
use sheetsync_store::TableDir;
use std::path::Path;

/// First row of `sheet` whose `key_column` cell equals `key` exactly
pub fn lookup(dir: &Path, sheet: &str, key_column: &str, key: &str) -> Result<Record> {
    let table = TableDir::new(dir).read(sheet)?;
    Ok(table.find_record(key_column, key)?)
}

/// Every data row of `sheet` keyed by the header
pub fn read_records(dir: &Path, sheet: &str) -> Result<Vec<Record>> {
    Ok(TableDir::new(dir).read(sheet)?.records())
}
