//! Table-files in the working directory of a snapshot
//!
//! One file per sheet, named `<sheet title>.csv`, at the top level of the
//! working directory.

pub mod atomic;
pub mod codec;

use crate::errors::{io_error, table_error, Result};
use atomic::atomic_write;
use sheetsync_core::{SheetSyncError, Table};
use std::fs;
use std::path::{Path, PathBuf};

pub const TABLE_EXTENSION: &str = "csv";

/// Reject titles that cannot name a single top-level file
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(SheetSyncError::InvalidSheetName {
            name: name.to_string(),
        }
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TableDir {
    root: PathBuf,
}

impl TableDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, sheet: &str) -> Result<PathBuf> {
        validate_sheet_name(sheet)?;
        Ok(self.root.join(format!("{sheet}.{TABLE_EXTENSION}")))
    }

    /// Atomically replace the table-file of `table.name`
    pub fn write(&self, table: &Table) -> Result<()> {
        let path = self.path_for(&table.name)?;
        let bytes = codec::encode(&table.rows).map_err(|e| table_error(&table.name, e))?;
        atomic_write(&path, &bytes)?;
        tracing::debug!(sheet = %table.name, rows = table.rows.len(), "Wrote table-file");
        Ok(())
    }

    pub fn read(&self, sheet: &str) -> Result<Table> {
        let path = self.path_for(sheet)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SheetSyncError::SheetNotFound {
                    sheet: sheet.to_string(),
                }
                .into())
            }
            Err(e) => return Err(io_error("read_table", &e)),
        };
        let rows = codec::decode(&bytes).map_err(|e| table_error(sheet, e))?;
        Ok(Table::new(sheet, rows))
    }

    /// Sheet names of every table-file present, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .table_paths()?
            .iter()
            .filter_map(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Remove every table-file. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let paths = self.table_paths()?;
        for path in &paths {
            fs::remove_file(path).map_err(|e| io_error("remove_table", &e))?;
        }
        Ok(paths.len())
    }

    fn table_paths(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("list_tables", &e)),
        };
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error("list_tables", &e))?;
            let path = entry.path();
            let is_table = path.extension().is_some_and(|ext| ext == TABLE_EXTENSION);
            if is_table && path.is_file() {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}
