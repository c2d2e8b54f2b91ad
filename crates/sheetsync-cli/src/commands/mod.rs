pub mod grade;
pub mod lookup;
pub mod sync;

use sheetsync_core::ExError;
use sheetsync_engine::dataset::GitSheetsDataset;
use sheetsync_engine::{CachedDataset, DatasetConfig};
use std::path::Path;

pub(crate) fn open_dataset(config_path: &Path) -> Result<GitSheetsDataset, ExError> {
    let config = DatasetConfig::load(config_path)?;
    CachedDataset::open(&config)
}
