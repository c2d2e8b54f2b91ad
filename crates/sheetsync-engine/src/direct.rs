//! Uncached lookup straight against the dataset source
//!
//! Finds the key anywhere in one worksheet and returns that row keyed by the
//! worksheet's header. The shared cache is not involved. Each attempt runs
//! through a `CredentialSet`, so a quota rejection moves on to the next
//! service account.

use crate::clock::Clock;
use crate::config::DatasetConfig;
use crate::source::{find_in_rows, CredentialSet, DatasetSource, GoogleSheetsSource, Workbook};
use crate::Result;
use sheetsync_core::{log_op_end, log_op_error, log_op_start};
use sheetsync_core::{Record, SheetSyncError};

/// `key_column` reported when the key may sit in any column
pub const ANY_COLUMN: &str = "any column";

/// Service accounts for direct lookups: every key in `credentials_dir` when
/// configured, otherwise the single `credential_path` key
pub fn open_sources(config: &DatasetConfig) -> Result<CredentialSet<GoogleSheetsSource>> {
    match &config.credentials_dir {
        Some(dir) => CredentialSet::from_dir(dir.expose()),
        None => Ok(CredentialSet::new(vec![GoogleSheetsSource::from_credential_file(
            config.credential_path.expose(),
        )?])),
    }
}

pub fn lookup_record<D: DatasetSource, C: Clock>(
    sources: &CredentialSet<D, C>,
    url: &str,
    worksheet_index: usize,
    key: &str,
) -> Result<Record> {
    log_op_start!("direct_lookup", worksheet_index = worksheet_index);
    let start = std::time::Instant::now();

    let record = sources
        .call(|source| lookup_once(source, url, worksheet_index, key))
        .map_err(|e| {
            log_op_error!(
                "direct_lookup",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

    log_op_end!(
        "direct_lookup",
        duration_ms = start.elapsed().as_millis() as u64
    );
    Ok(record)
}

fn lookup_once<D: DatasetSource>(
    source: &D,
    url: &str,
    worksheet_index: usize,
    key: &str,
) -> Result<Record> {
    let workbook = source.open_by_url(url)?;
    let titles = workbook.sheet_titles()?;
    let sheet = titles
        .get(worksheet_index)
        .ok_or_else(|| SheetSyncError::SheetNotFound {
            sheet: format!("#{worksheet_index}"),
        })?;

    let not_found = || SheetSyncError::RecordNotFound {
        sheet: sheet.clone(),
        key_column: ANY_COLUMN.to_string(),
        key: key.to_string(),
    };
    // One fetch; the hit's row index must refer to the rows we read
    let rows = workbook.get_all_rows(sheet)?;
    let cell = find_in_rows(&rows, key).ok_or_else(not_found)?;
    let (Some(header), Some(row)) = (rows.first(), rows.get(cell.row)) else {
        return Err(not_found().into());
    };
    Ok(Record::from_row(header, row))
}
