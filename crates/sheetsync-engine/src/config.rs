//! Dataset configuration file
//!
//! ```toml
//! store_location = "git@github.com:course/roster-cache.git"
//! dataset_location = "https://docs.google.com/spreadsheets/d/<id>/edit"
//! credential_path = "keys/google-service-account.json"
//! credentials_dir = "keys/google-service-accounts" # optional, direct lookups
//! deploy_key = "keys/deploy_key"      # optional
//! cache_root = ".sheetsync/cache"     # optional
//! branch = "master"                   # optional
//!
//! [identity]                          # optional
//! name = "sheetsync"
//! email = "sheetsync@localhost"
//! ```
//!
//! Unknown keys are rejected.

use crate::Result;
use serde::Deserialize;
use sheetsync_core::SheetSyncError;
use sheetsync_core_types::Sensitive;
use sheetsync_store::{repo_name_from_url, Identity, StoreConfig};
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_ROOT: &str = ".sheetsync/cache";
pub const DEFAULT_BRANCH: &str = "master";

fn default_cache_root() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_ROOT)
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Remote of the shared cache repository
    pub store_location: String,
    /// URL of the authoritative workbook
    pub dataset_location: String,
    /// Service-account key file for the dataset source
    pub credential_path: Sensitive<PathBuf>,
    /// Directory of `*.json` keys rotated through by direct lookups
    #[serde(default)]
    pub credentials_dir: Option<Sensitive<PathBuf>>,
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,
    #[serde(default)]
    pub deploy_key: Option<Sensitive<PathBuf>>,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub identity: Identity,
}

fn invalid(reason: impl Into<String>) -> sheetsync_core::ExError {
    SheetSyncError::Config {
        reason: reason.into(),
    }
    .into()
}

impl DatasetConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| invalid(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store_location.trim().is_empty() {
            return Err(invalid("store_location must not be empty"));
        }
        if self.dataset_location.trim().is_empty() {
            return Err(invalid("dataset_location must not be empty"));
        }
        let branch_ok = !self.branch.is_empty()
            && !self.branch.starts_with(['-', '/'])
            && !self.branch.contains(|c: char| c.is_whitespace() || c == ':' || c == '\\')
            && !self.branch.contains("..");
        if !branch_ok {
            return Err(invalid(format!("unusable branch name {:?}", self.branch)));
        }
        Ok(())
    }

    /// `cache_root/<repo name>`
    pub fn working_dir(&self) -> PathBuf {
        self.cache_root.join(repo_name_from_url(&self.store_location))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            remote_url: self.store_location.clone(),
            branch: self.branch.clone(),
            dir: self.working_dir(),
            identity: self.identity.clone(),
            deploy_key: self.deploy_key.clone(),
        }
    }
}
