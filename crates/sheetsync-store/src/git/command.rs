//! Runner for the `git` binary
//!
//! Every invocation is pinned to one directory, never prompts, and carries
//! the configured commit identity and deploy key.

use crate::errors::{git_failure, io_error, Result};
use serde::Deserialize;
use sheetsync_core_types::Sensitive;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

pub const DEFAULT_AUTHOR_NAME: &str = "sheetsync";
pub const DEFAULT_AUTHOR_EMAIL: &str = "sheetsync@localhost";

/// Author and committer identity for cache commits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUTHOR_NAME.to_string(),
            email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Git {
    dir: PathBuf,
    identity: Identity,
    deploy_key: Option<Sensitive<PathBuf>>,
}

impl Git {
    pub fn new(dir: impl Into<PathBuf>, identity: Identity, deploy_key: Option<Sensitive<PathBuf>>) -> Self {
        Self {
            dir: dir.into(),
            identity,
            deploy_key,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run git and require success. Returns trimmed stdout.
    pub fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(git_failure(args, &output.status, &output.stderr))
        }
    }

    /// Run git and report only whether it exited successfully
    pub fn succeeds(&self, args: &[&str]) -> Result<bool> {
        Ok(self.output(args)?.status.success())
    }

    /// Run a commit-producing subcommand with signing disabled
    pub fn commit(&self, message: &str) -> Result<()> {
        self.run(&[
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "--allow-empty",
            "--no-verify",
            "-m",
            message,
        ])
        .map(|_| ())
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!(dir = %self.dir.display(), args = ?args, "git");
        self.command(args)
            .output()
            .map_err(|e| io_error("spawn_git", &e))
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.dir)
            .args(args)
            .env("GIT_AUTHOR_NAME", &self.identity.name)
            .env("GIT_AUTHOR_EMAIL", &self.identity.email)
            .env("GIT_COMMITTER_NAME", &self.identity.name)
            .env("GIT_COMMITTER_EMAIL", &self.identity.email)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        if let Some(key) = &self.deploy_key {
            cmd.env("GIT_SSH_COMMAND", ssh_command(key.expose()));
        }
        cmd
    }
}

fn ssh_command(key: &Path) -> String {
    let quoted = key.display().to_string().replace('\'', r"'\''");
    format!("ssh -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new -i '{quoted}'")
}

/// Whether a usable `git` binary is on the PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
