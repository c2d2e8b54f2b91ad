//! Force one sync round

use clap::Args;
use sheetsync_engine::SyncOutcome;
use std::path::Path;

#[derive(Debug, Args)]
pub struct SyncArgs {}

pub fn execute(_args: SyncArgs, config: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = super::open_dataset(config)?;

    match dataset.sync()? {
        SyncOutcome::Refreshed(report) => println!(
            "Refreshed: published {} ({} sheets, digest {})",
            report.revision.short_id(),
            report.manifest.tables.len(),
            report.manifest.short_digest()
        ),
        SyncOutcome::Waited(report) => println!(
            "Waited: revision {} became fresh after {} checks",
            report.revision.short_id(),
            report.attempts
        ),
    }
    Ok(())
}
