//! Local working copy of the shared cache repository
//!
//! The copy tracks exactly one published branch. It is always reset hard to
//! the published tip before use, so a crashed writer can never leak local
//! state into the next reader.

use super::command::{Git, Identity};
use crate::errors::{store_invariant, Result};
use crate::snapshot::SnapshotStore;
use chrono::{TimeZone, Utc};
use sheetsync_core::Revision;
use sheetsync_core_types::Sensitive;
use std::fs;
use std::path::{Path, PathBuf};

/// Location and credentials of one cache repository
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub remote_url: String,
    pub branch: String,
    pub dir: PathBuf,
    pub identity: Identity,
    pub deploy_key: Option<Sensitive<PathBuf>>,
}

impl StoreConfig {
    pub fn new(remote_url: impl Into<String>, branch: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            remote_url: remote_url.into(),
            branch: branch.into(),
            dir: dir.into(),
            identity: Identity::default(),
            deploy_key: None,
        }
    }
}

/// Last path segment of a repository URL without its `.git` suffix
///
/// ```
/// use sheetsync_store::repo_name_from_url;
///
/// assert_eq!(repo_name_from_url("git@github.com:course/roster-cache.git"), "roster-cache");
/// assert_eq!(repo_name_from_url("https://host/a/b/"), "b");
/// ```
pub fn repo_name_from_url(url: &str) -> String {
    let tail = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = tail.strip_suffix(".git").unwrap_or(tail).trim();
    if name.is_empty() {
        "cache".to_string()
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct GitWorkingCopy {
    remote_url: String,
    branch: String,
    git: Git,
}

impl GitWorkingCopy {
    pub fn new(config: StoreConfig) -> Self {
        let git = Git::new(config.dir, config.identity, config.deploy_key);
        Self {
            remote_url: config.remote_url,
            branch: config.branch,
            git,
        }
    }

    pub fn dir(&self) -> &Path {
        self.git.dir()
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn tracking_ref(&self) -> String {
        format!("refs/remotes/origin/{}", self.branch)
    }

    fn is_initialized(&self) -> bool {
        self.dir().join(".git").exists()
    }

    fn initialize(&self) -> Result<()> {
        let dir = self.dir();
        if dir.exists() {
            fs::remove_dir_all(dir)
                .map_err(|e| crate::errors::io_error("clear_working_copy", &e))?;
        }
        fs::create_dir_all(dir).map_err(|e| crate::errors::io_error("create_working_copy", &e))?;
        self.git.run(&["init", "-q"])?;
        self.git
            .run(&["remote", "add", "-t", &self.branch, "origin", &self.remote_url])?;
        tracing::debug!(dir = %dir.display(), "Initialized working copy");
        Ok(())
    }

    fn fetch(&self) -> Result<()> {
        match self.git.run(&["fetch", "-q", "--prune", "origin"]) {
            Ok(_) => Ok(()),
            Err(fetch_err) => {
                // An empty remote has no ref matching the configured refspec
                let listed = self.git.run(&["ls-remote", "--heads", "origin", &self.branch])?;
                if listed.is_empty() {
                    tracing::debug!(branch = %self.branch, "Remote branch not published yet");
                    Ok(())
                } else {
                    Err(fetch_err)
                }
            }
        }
    }

    /// Whether the remote branch existed at the last fetch
    pub fn has_published_branch(&self) -> Result<bool> {
        self.git
            .succeeds(&["rev-parse", "--verify", "--quiet", &self.tracking_ref()])
    }

    /// Reset the working tree to the last fetched published tip and remove
    /// every untracked or ignored file
    pub fn restore_published(&self) -> Result<()> {
        if self.has_published_branch()? {
            self.git
                .run(&["checkout", "-q", "-f", "--detach", &self.tracking_ref()])?;
        } else {
            let local = format!("refs/heads/{}", self.branch);
            self.git.run(&["symbolic-ref", "HEAD", &local])?;
            // A leftover local branch would become the parent of the first publish
            self.git.succeeds(&["update-ref", "-d", &local])?;
            self.git.run(&["read-tree", "--empty"])?;
        }
        self.git.run(&["clean", "-q", "-d", "-f", "-x"])?;
        Ok(())
    }

    /// Switch to a fresh orphan branch holding one empty marker commit
    pub fn start_orphan(&self, name: &str, message: &str) -> Result<()> {
        let branch = format!("refs/heads/{}", name);
        self.git.run(&["symbolic-ref", "HEAD", &branch])?;
        self.git.run(&["read-tree", "--empty"])?;
        self.git.commit(message)
    }

    /// Push HEAD as a new remote branch. Returns false when the remote
    /// refused the ref, which includes the ref already existing.
    pub fn push_new_ref(&self, name: &str) -> Result<bool> {
        let refspec = format!("HEAD:refs/heads/{}", name);
        self.git.succeeds(&["push", "-q", "origin", &refspec])
    }

    pub fn delete_local_branch(&self, name: &str) -> Result<()> {
        self.git.run(&["branch", "-q", "-D", name]).map(|_| ())
    }

    pub fn delete_remote_ref(&self, name: &str) -> Result<()> {
        let refspec = format!(":refs/heads/{}", name);
        self.git.run(&["push", "-q", "origin", &refspec]).map(|_| ())
    }
}

impl SnapshotStore for GitWorkingCopy {
    fn pull(&self) -> Result<()> {
        if !self.is_initialized() {
            self.initialize()?;
        }
        self.fetch()?;
        self.restore_published()
    }

    fn publish(&self, label: &str) -> Result<Revision> {
        self.git.run(&["add", "-A"])?;
        self.git.commit(label)?;
        let refspec = format!("HEAD:refs/heads/{}", self.branch);
        self.git.run(&["push", "-q", "origin", &refspec])?;
        self.head_revision()?
            .ok_or_else(|| store_invariant("publish", "HEAD missing after commit"))
    }

    fn head_revision(&self) -> Result<Option<Revision>> {
        if !self.git.succeeds(&["rev-parse", "--verify", "--quiet", "HEAD"])? {
            return Ok(None);
        }
        let line = self.git.run(&["log", "-1", "--format=%H %ct", "HEAD"])?;
        parse_revision_line(&line).map(Some)
    }

    fn working_dir(&self) -> &Path {
        self.dir()
    }
}

fn parse_revision_line(line: &str) -> Result<Revision> {
    let malformed = || store_invariant("head_revision", format!("unexpected git log output: {line:?}"));
    let (id, secs) = line.split_once(' ').ok_or_else(malformed)?;
    let secs: i64 = secs.trim().parse().map_err(|_| malformed())?;
    let committed_at = Utc.timestamp_opt(secs, 0).single().ok_or_else(malformed)?;
    Ok(Revision::new(id, committed_at))
}
