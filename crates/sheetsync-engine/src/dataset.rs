//! `CachedDataset`: the caller-facing API
//!
//! Every read syncs first, and the whole sync-then-read sequence runs under
//! the working copy's local lease.

use crate::clock::{Clock, SystemClock};
use crate::config::DatasetConfig;
use crate::reader;
use crate::source::{DatasetSource, GoogleSheetsSource};
use crate::sync::{SyncOutcome, Syncer};
use crate::Result;
use sheetsync_core::{log_op_end, log_op_error, log_op_start};
use sheetsync_core::{Record, SyncPolicy};
use sheetsync_store::lease::DEFAULT_LEASE_TIMEOUT;
use sheetsync_store::{GitRefLock, GitWorkingCopy, LocalLease, SnapshotStore, TryAcquire};
use std::time::Duration;

/// A dataset cached in git and fed from Google Sheets
pub type GitSheetsDataset = CachedDataset<GitWorkingCopy, GitRefLock, GoogleSheetsSource>;

pub struct CachedDataset<S, L, D, C = SystemClock> {
    syncer: Syncer<S, L, D, C>,
    lease_timeout: Duration,
}

impl CachedDataset<GitWorkingCopy, GitRefLock, GoogleSheetsSource> {
    pub fn open(config: &DatasetConfig) -> Result<Self> {
        Self::open_with_policy(config, SyncPolicy::default())
    }

    pub fn open_with_policy(config: &DatasetConfig, policy: SyncPolicy) -> Result<Self> {
        let source = GoogleSheetsSource::from_credential_file(config.credential_path.expose())?;
        let store_config = config.store_config();
        let lock = GitRefLock::new(GitWorkingCopy::new(store_config.clone()), policy.lock_round)
            .with_remote_pruning(policy.prune_lock_refs);
        let store = GitWorkingCopy::new(store_config);
        let syncer = Syncer::new(store, lock, source, config.dataset_location.clone(), policy);
        Ok(Self::new(syncer))
    }
}

impl<S, L, D, C> CachedDataset<S, L, D, C> {
    pub fn new(syncer: Syncer<S, L, D, C>) -> Self {
        Self {
            syncer,
            lease_timeout: DEFAULT_LEASE_TIMEOUT,
        }
    }

    pub fn with_lease_timeout(mut self, timeout: Duration) -> Self {
        self.lease_timeout = timeout;
        self
    }

    pub fn syncer(&self) -> &Syncer<S, L, D, C> {
        &self.syncer
    }
}

impl<S, L, D, C> CachedDataset<S, L, D, C>
where
    S: SnapshotStore,
    L: TryAcquire,
    D: DatasetSource,
    C: Clock,
{
    fn lease(&self) -> Result<LocalLease> {
        LocalLease::acquire_with(self.syncer.store().working_dir(), self.lease_timeout)
    }

    /// Refresh or wait for a fresh snapshot without reading it
    pub fn sync(&self) -> Result<SyncOutcome> {
        let _lease = self.lease()?;
        self.syncer.sync()
    }

    /// Sync, then return the first row of `sheet` whose `key_column` cell
    /// equals `key`
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no such sheet, no `key_column`, or no matching row
    /// - `Timeout`: the snapshot never became fresh
    /// - anything `sync()` fails with
    pub fn lookup(&self, sheet: &str, key_column: &str, key: &str) -> Result<Record> {
        log_op_start!("lookup", sheet = sheet, key_column = key_column);
        let start = std::time::Instant::now();

        let record = self.lookup_impl(sheet, key_column, key).map_err(|e| {
            log_op_error!(
                "lookup",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                sheet = sheet
            );
            e
        })?;

        log_op_end!(
            "lookup",
            duration_ms = start.elapsed().as_millis() as u64,
            sheet = sheet
        );
        Ok(record)
    }

    fn lookup_impl(&self, sheet: &str, key_column: &str, key: &str) -> Result<Record> {
        let _lease = self.lease()?;
        self.syncer.sync()?;
        reader::lookup(self.syncer.store().working_dir(), sheet, key_column, key)
    }

    /// Sync, then return every data row of `sheet`
    pub fn read_table(&self, sheet: &str) -> Result<Vec<Record>> {
        log_op_start!("read_table", sheet = sheet);
        let start = std::time::Instant::now();

        let records = self.read_table_impl(sheet).map_err(|e| {
            log_op_error!(
                "read_table",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                sheet = sheet
            );
            e
        })?;

        log_op_end!(
            "read_table",
            duration_ms = start.elapsed().as_millis() as u64,
            sheet = sheet,
            rows = records.len()
        );
        Ok(records)
    }

    fn read_table_impl(&self, sheet: &str) -> Result<Vec<Record>> {
        let _lease = self.lease()?;
        self.syncer.sync()?;
        reader::read_records(self.syncer.store().working_dir(), sheet)
    }
}
