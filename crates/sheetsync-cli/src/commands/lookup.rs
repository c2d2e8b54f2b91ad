//! Print one row as JSON

use clap::Args;
use sheetsync_engine::{direct, DatasetConfig};
use std::path::Path;

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Value to look for
    pub key: String,

    #[arg(long, default_value = "Roster")]
    pub sheet: String,

    #[arg(long, default_value = "Student ID")]
    pub key_column: String,

    /// Search one worksheet of the source directly, bypassing the cache
    #[arg(long)]
    pub direct: bool,

    /// Worksheet searched by --direct
    #[arg(long, default_value_t = 0, requires = "direct")]
    pub worksheet_index: usize,
}

pub fn execute(args: LookupArgs, config: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let record = if args.direct {
        let config = DatasetConfig::load(config)?;
        let sources = direct::open_sources(&config)?;
        direct::lookup_record(&sources, &config.dataset_location, args.worksheet_index, &args.key)?
    } else {
        super::open_dataset(config)?.lookup(&args.sheet, &args.key_column, &args.key)?
    };

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
