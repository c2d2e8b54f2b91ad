//! In-memory dataset source
//!
//! Clones share state, so a test can keep a handle, edit sheets between
//! syncs, inject quota rejections and count how often the source was
//! actually fetched.

use super::{DatasetSource, Workbook};
use crate::Result;
use sheetsync_core::SheetSyncError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Sheets = Vec<(String, Vec<Vec<String>>)>;

#[derive(Debug, Default)]
struct State {
    workbooks: HashMap<String, Sheets>,
    failure: Option<String>,
    exhausted_opens: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    state: Arc<Mutex<State>>,
    opens: Arc<AtomicUsize>,
    row_reads: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(self, url: &str, title: &str, rows: Vec<Vec<String>>) -> Self {
        self.set_sheet(url, title, rows);
        self
    }

    /// Replace a sheet's rows, appending the sheet if it is new
    pub fn set_sheet(&self, url: &str, title: &str, rows: Vec<Vec<String>>) {
        let mut state = self.lock();
        let sheets = state.workbooks.entry(url.to_string()).or_default();
        match sheets.iter_mut().find(|(t, _)| t == title) {
            Some((_, existing)) => *existing = rows,
            None => sheets.push((title.to_string(), rows)),
        }
    }

    pub fn remove_sheet(&self, url: &str, title: &str) {
        if let Some(sheets) = self.lock().workbooks.get_mut(url) {
            sheets.retain(|(t, _)| t != title);
        }
    }

    /// Make every following open fail with `message` until cleared
    pub fn set_failure(&self, message: Option<&str>) {
        self.lock().failure = message.map(String::from);
    }

    /// Reject the next `opens` opens as over quota
    pub fn set_exhausted_for(&self, opens: usize) {
        self.lock().exhausted_opens = opens;
    }

    /// How many times a sheet's rows were read, across all workbooks
    pub fn row_read_count(&self) -> usize {
        self.row_reads.load(Ordering::SeqCst)
    }

    /// How many times a workbook was opened
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Point-in-time copy of one workbook
#[derive(Debug, Clone)]
pub struct MemoryWorkbook {
    sheets: Sheets,
    row_reads: Arc<AtomicUsize>,
}

impl DatasetSource for MemorySource {
    type Workbook = MemoryWorkbook;

    fn open_by_url(&self, url: &str) -> Result<MemoryWorkbook> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.exhausted_opens > 0 {
            state.exhausted_opens -= 1;
            return Err(SheetSyncError::ResourceExhausted {
                op: "open_by_url".to_string(),
                message: "quota exceeded".to_string(),
            }
            .into());
        }
        if let Some(message) = &state.failure {
            return Err(SheetSyncError::Source {
                op: "open_by_url".to_string(),
                message: message.clone(),
            }
            .into());
        }
        let sheets = state.workbooks.get(url).cloned().ok_or_else(|| SheetSyncError::Source {
            op: "open_by_url".to_string(),
            message: format!("no workbook at {url}"),
        })?;
        Ok(MemoryWorkbook {
            sheets,
            row_reads: self.row_reads.clone(),
        })
    }
}

impl Workbook for MemoryWorkbook {
    fn sheet_titles(&self) -> Result<Vec<String>> {
        Ok(self.sheets.iter().map(|(t, _)| t.clone()).collect())
    }

    fn get_all_rows(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        self.row_reads.fetch_add(1, Ordering::SeqCst);
        self.sheets
            .iter()
            .find(|(t, _)| t == sheet)
            .map(|(_, rows)| super::rectangular(rows.clone()))
            .ok_or_else(|| {
                SheetSyncError::SheetNotFound {
                    sheet: sheet.to_string(),
                }
                .into()
            })
    }
}
