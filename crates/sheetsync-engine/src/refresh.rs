//! Refresh Worker: materialize the source as the next snapshot
//!
//! Runs only while the caller holds the round's lock. Every sheet is fetched
//! into memory before the working copy is touched, so a failed fetch leaves
//! nothing to publish.

use crate::source::{DatasetSource, Workbook};
use crate::Result;
use sheetsync_core::{log_op_end, log_op_error, log_op_start};
use sheetsync_core::{ExError, Revision, SheetSyncError, SnapshotManifest, Table};
use sheetsync_store::table::validate_sheet_name;
use sheetsync_store::{SnapshotStore, TableDir};

/// What one refresh published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub revision: Revision,
    pub manifest: SnapshotManifest,
    /// Table-files of the previous snapshot removed before writing
    pub removed: usize,
}

/// Pull, fetch every sheet, replace the table-files and publish
///
/// ## Errors
///
/// Any pull, fetch, write or publish failure. Nothing is published when
/// the fetch fails.
pub fn refresh<S, D>(store: &S, source: &D, dataset_url: &str) -> Result<RefreshReport>
where
    S: SnapshotStore,
    D: DatasetSource,
{
    log_op_start!("refresh");
    let start = std::time::Instant::now();

    let report = refresh_impl(store, source, dataset_url).map_err(|e| {
        log_op_error!(
            "refresh",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "refresh",
        duration_ms = start.elapsed().as_millis() as u64,
        revision = report.revision.short_id(),
        digest = report.manifest.short_digest(),
        sheets = report.manifest.tables.len()
    );
    Ok(report)
}

fn refresh_impl<S, D>(store: &S, source: &D, dataset_url: &str) -> Result<RefreshReport>
where
    S: SnapshotStore,
    D: DatasetSource,
{
    store.pull()?;

    let tables = fetch_all(source, dataset_url)?;
    let manifest = SnapshotManifest::from_tables(&tables)?;

    let dir = TableDir::new(store.working_dir());
    let removed = dir.clear()?;
    for table in &tables {
        dir.write(table)?;
    }

    let revision = store.publish(&format!("sync {}", manifest.short_digest()))?;
    Ok(RefreshReport {
        revision,
        manifest,
        removed,
    })
}

/// Every sheet of the workbook, in workbook order
pub fn fetch_all<D: DatasetSource>(source: &D, dataset_url: &str) -> Result<Vec<Table>> {
    let workbook = source.open_by_url(dataset_url)?;
    let mut tables = Vec::new();
    for title in workbook.sheet_titles()? {
        validate_sheet_name(&title).map_err(|e| unusable_title(&title, e))?;
        let rows = workbook.get_all_rows(&title)?;
        tracing::debug!(sheet = %title, rows = rows.len(), "Fetched sheet");
        tables.push(Table::new(title, rows));
    }
    Ok(tables)
}

/// A title the source hands us that cannot name a table-file is the
/// source's fault, not the caller's
fn unusable_title(title: &str, err: ExError) -> ExError {
    ExError::from(SheetSyncError::Source {
        op: "fetch_all".to_string(),
        message: err.to_string(),
    })
    .with_sheet(title)
}
