//! Rotation across several service accounts on quota rejection
//!
//! A call runs against each source in turn until one of them is not over
//! quota. When every source is exhausted the set sleeps and starts another
//! round, up to a fixed number of rounds. Any other failure is returned as
//! is, without trying the remaining sources.

use super::google::GoogleSheetsSource;
use crate::clock::{Clock, SystemClock};
use crate::Result;
use sheetsync_core::{ExErrorKind, SheetSyncError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Pause after a round in which every source was exhausted
pub const DEFAULT_EXHAUSTION_BACKOFF: Duration = Duration::from_secs(10);

/// Rounds through the whole set before giving up
pub const DEFAULT_EXHAUSTION_ROUNDS: u32 = 500;

pub struct CredentialSet<D, C = SystemClock> {
    sources: Vec<D>,
    rounds: u32,
    backoff: Duration,
    clock: C,
}

impl<D> CredentialSet<D, SystemClock> {
    pub fn new(sources: Vec<D>) -> Self {
        Self {
            sources,
            rounds: DEFAULT_EXHAUSTION_ROUNDS,
            backoff: DEFAULT_EXHAUSTION_BACKOFF,
            clock: SystemClock,
        }
    }
}

impl CredentialSet<GoogleSheetsSource, SystemClock> {
    /// One Google source per `*.json` key file in `dir`, in file name order
    ///
    /// # Errors
    ///
    /// `Credential` when the directory cannot be read, holds no key file, or
    /// any key file is unusable.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let unreadable = |e: std::io::Error| SheetSyncError::Credential {
            reason: format!("cannot list service account keys: {e}"),
        };
        let mut keys: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(unreadable)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()
            .map_err(unreadable)?;
        keys.retain(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"));
        keys.sort();

        if keys.is_empty() {
            return Err(SheetSyncError::Credential {
                reason: "no service account key files found".to_string(),
            }
            .into());
        }
        let sources = keys
            .iter()
            .map(|path| GoogleSheetsSource::from_credential_file(path))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(count = sources.len(), "Loaded service accounts");
        Ok(Self::new(sources))
    }
}

impl<D, C> CredentialSet<D, C> {
    pub fn with_retry(mut self, rounds: u32, backoff: Duration) -> Self {
        self.rounds = rounds;
        self.backoff = backoff;
        self
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> CredentialSet<D, C2> {
        CredentialSet {
            sources: self.sources,
            rounds: self.rounds,
            backoff: self.backoff,
            clock,
        }
    }

    pub fn sources(&self) -> &[D] {
        &self.sources
    }
}

impl<D, C: Clock> CredentialSet<D, C> {
    /// Run `op` against the first source that is not over quota
    ///
    /// # Errors
    ///
    /// The first failure that is not a quota rejection, or
    /// `ResourceExhausted` once every round found every source exhausted.
    pub fn call<T>(&self, op: impl Fn(&D) -> Result<T>) -> Result<T> {
        for round in 1..=self.rounds {
            for (index, source) in self.sources.iter().enumerate() {
                match op(source) {
                    Err(e) if e.kind() == ExErrorKind::ResourceExhausted => {
                        tracing::debug!(round, index, "Service account exhausted, trying the next one");
                    }
                    result => return result,
                }
            }
            if round < self.rounds {
                tracing::warn!(
                    round,
                    backoff_secs = self.backoff.as_secs(),
                    "Every service account is exhausted, backing off"
                );
                self.clock.sleep(self.backoff);
            }
        }

        Err(SheetSyncError::ResourceExhausted {
            op: "credential_rotation".to_string(),
            message: format!(
                "all {} service accounts exhausted for {} rounds",
                self.sources.len(),
                self.rounds
            ),
        }
        .into())
    }
}
