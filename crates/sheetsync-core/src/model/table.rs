//! In-memory form of one table-file

use crate::errors::{Result, SheetSyncError};
use crate::model::record::Record;

/// All rows of one sheet; the first row is the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// The header row, if the sheet has any rows at all
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Data rows below the header
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header()?.iter().position(|c| c == column)
    }

    /// Every data row as a header-keyed record, in sheet order
    pub fn records(&self) -> Vec<Record> {
        let Some(header) = self.header() else {
            return Vec::new();
        };
        self.data_rows()
            .iter()
            .map(|row| Record::from_row(header, row))
            .collect()
    }

    /// First row whose `key_column` cell equals `key` exactly
    ///
    /// Linear scan; no index is kept. A sheet without `key_column` simply
    /// has no matching row.
    pub fn find_record(&self, key_column: &str, key: &str) -> Result<Record> {
        let not_found = || SheetSyncError::RecordNotFound {
            sheet: self.name.clone(),
            key_column: key_column.to_string(),
            key: key.to_string(),
        };
        let (Some(header), Some(idx)) = (self.header(), self.column_index(key_column)) else {
            return Err(not_found());
        };

        self.data_rows()
            .iter()
            .find(|row| row.get(idx).map(String::as_str) == Some(key))
            .map(|row| Record::from_row(header, row))
            .ok_or_else(not_found)
    }
}
