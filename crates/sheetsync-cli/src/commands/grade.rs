//! Autograder report for the submitting student
//!
//! Reads the student ID, looks up the student's row and writes the results
//! file. Failures never abort the report: they replace its content with a
//! visible or a generic message, depending on the error class.
//!
//! Outside the grading container, `--test-id` stands in for the ID file and
//! the report goes to stdout instead of the results file.

use crate::report::{self, Messenger};
use clap::Args;
use sheetsync_core::{ExError, ExErrorKind, Record, SheetSyncError};
use sheetsync_engine::{direct, CachedDataset, DatasetConfig};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ID_FILE: &str = "/autograder/submission/id.txt";
pub const DEFAULT_RESULTS_FILE: &str = "/autograder/results/results.json";
pub const STUDENT_ID_FILE_ERROR: &str = "An error occurred while parsing your student ID file.";

/// Submitting this ID only refreshes the cache
pub const SYNC_SENTINEL: &str = "SYNC";

#[derive(Debug, Args)]
pub struct GradeArgs {
    #[arg(long, default_value = "Roster")]
    pub sheet: String,

    #[arg(long, default_value = "Student ID")]
    pub key_column: String,

    #[arg(long, default_value = DEFAULT_ID_FILE)]
    pub id_file: PathBuf,

    /// Grade this ID without an ID file and print the report
    #[arg(long, conflicts_with = "id_file")]
    pub test_id: Option<String>,

    #[arg(long, default_value = DEFAULT_RESULTS_FILE)]
    pub results: PathBuf,

    /// Section title shown above the table
    #[arg(long, default_value = "Your Record")]
    pub section: String,

    /// `Label=Column` or `Column`; repeat for several rows. Defaults to
    /// every column of the record.
    #[arg(long = "column")]
    pub columns: Vec<String>,

    /// Search one worksheet of the source directly, bypassing the cache
    #[arg(long)]
    pub direct: bool,

    #[arg(long, default_value_t = 0, requires = "direct")]
    pub worksheet_index: usize,
}

pub fn execute(args: GradeArgs, config: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut messenger = Messenger::default();

    if let Err(err) = generate(&args, config, &mut messenger) {
        if err.is_user_visible() {
            eprintln!("Visible error: {}", err);
        } else {
            eprintln!("Internal error: {}", err);
        }
        messenger.reset();
        messenger.log(report::error_message(&err));
    }

    let results = messenger.to_results();
    if args.test_id.is_some() {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        report::write_results(&args.results, &results)?;
    }
    Ok(())
}

fn generate(args: &GradeArgs, config: &Path, messenger: &mut Messenger) -> Result<(), ExError> {
    let student_id = match &args.test_id {
        Some(id) => id.clone(),
        None => read_student_id(&args.id_file)?,
    };
    let config = DatasetConfig::load(config)?;

    if student_id == SYNC_SENTINEL {
        CachedDataset::open(&config)?.sync()?;
        messenger.log("Successfully performed sync.");
        return Ok(());
    }

    let record = if args.direct {
        let sources = direct::open_sources(&config)?;
        direct::lookup_record(&sources, &config.dataset_location, args.worksheet_index, &student_id)?
    } else {
        CachedDataset::open(&config)?.lookup(&args.sheet, &args.key_column, &student_id)?
    };

    let rows = select_columns(&record, &args.columns)?;
    messenger.log_section(&args.section, report::render_table(&rows));
    Ok(())
}

pub fn read_student_id(path: &Path) -> Result<String, ExError> {
    fs::read_to_string(path)
        .map(|text| text.trim().to_string())
        .ok()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("read_student_id")
                .with_message(STUDENT_ID_FILE_ERROR)
        })
}

/// Label and value rows for the report
fn select_columns(record: &Record, columns: &[String]) -> Result<Vec<(String, String)>, ExError> {
    if columns.is_empty() {
        return Ok(record
            .iter()
            .map(|(column, value)| (column.to_string(), value.to_string()))
            .collect());
    }

    columns
        .iter()
        .map(|spec| {
            let (label, column) = spec.split_once('=').unwrap_or((spec.as_str(), spec.as_str()));
            let value = record.get(column).ok_or_else(|| -> ExError {
                SheetSyncError::Config {
                    reason: format!("record has no column {column:?}"),
                }
                .into()
            })?;
            Ok((label.to_string(), value.to_string()))
        })
        .collect()
}
