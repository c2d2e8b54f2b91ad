//! Authoritative dataset sources
//!
//! A source opens a workbook by URL; a workbook is a set of named sheets,
//! each an ordered list of rows of display text.

pub mod google;
pub mod memory;
pub mod rotation;

pub use google::GoogleSheetsSource;
pub use memory::MemorySource;
pub use rotation::CredentialSet;

use crate::Result;

/// A matched cell. Indices are zero-based; row 0 is the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

pub trait Workbook {
    /// Sheet titles in workbook order
    fn sheet_titles(&self) -> Result<Vec<String>>;

    /// Every row of the sheet, cells as displayed
    fn get_all_rows(&self, sheet: &str) -> Result<Vec<Vec<String>>>;

    /// First cell whose text equals `query`, scanning row by row
    fn find(&self, sheet: &str, query: &str) -> Result<Option<Cell>> {
        let rows = self.get_all_rows(sheet)?;
        Ok(find_in_rows(&rows, query))
    }
}

pub trait DatasetSource {
    type Workbook: Workbook;

    fn open_by_url(&self, url: &str) -> Result<Self::Workbook>;
}

pub(crate) fn find_in_rows(rows: &[Vec<String>], query: &str) -> Option<Cell> {
    rows.iter().enumerate().find_map(|(row, cells)| {
        cells.iter().position(|c| c == query).map(|col| Cell {
            row,
            col,
            value: cells[col].clone(),
        })
    })
}

/// Pad every row to the width of the widest one
pub(crate) fn rectangular(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    rows
}
