//! Shared fixtures: a bare remote seeded with plain git commands
#![allow(dead_code)]

use sheetsync_store::{git::git_available, GitWorkingCopy, StoreConfig};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const BRANCH: &str = "master";

pub fn skip_without_git() -> bool {
    if git_available() {
        false
    } else {
        eprintln!("git not available; skipping");
        true
    }
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .env("GIT_AUTHOR_NAME", "fixture")
        .env("GIT_AUTHOR_EMAIL", "fixture@localhost")
        .env("GIT_COMMITTER_NAME", "fixture")
        .env("GIT_COMMITTER_EMAIL", "fixture@localhost")
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

pub struct Remote {
    pub root: TempDir,
    pub url: String,
}

impl Remote {
    /// A bare repository with nothing published
    pub fn empty() -> Self {
        let root = TempDir::new().unwrap();
        let bare = root.path().join("remote.git");
        std::fs::create_dir_all(&bare).unwrap();
        git(&bare, &["init", "-q", "--bare"]);
        git(&bare, &["symbolic-ref", "HEAD", &format!("refs/heads/{BRANCH}")]);
        let url = bare.display().to_string();
        Self { root, url }
    }

    /// A bare repository whose branch holds the given files
    pub fn seeded(files: &[(&str, &str)]) -> Self {
        let remote = Self::empty();
        let scratch = remote.root.path().join("seed");
        std::fs::create_dir_all(&scratch).unwrap();
        git(&scratch, &["init", "-q"]);
        for (name, content) in files {
            std::fs::write(scratch.join(name), content).unwrap();
        }
        git(&scratch, &["add", "-A"]);
        git(&scratch, &["-c", "commit.gpgsign=false", "commit", "-q", "--allow-empty", "-m", "seed"]);
        git(&scratch, &["push", "-q", &remote.url, &format!("HEAD:refs/heads/{BRANCH}")]);
        remote
    }

    pub fn bare_path(&self) -> PathBuf {
        PathBuf::from(&self.url)
    }

    pub fn branch_tip(&self) -> String {
        git(&self.bare_path(), &["rev-parse", BRANCH])
    }

    pub fn has_ref(&self, name: &str) -> bool {
        Command::new("git")
            .arg("-C")
            .arg(self.bare_path())
            .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{name}")])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// A working copy of this remote under `dir`
    pub fn working_copy(&self, dir: &Path) -> GitWorkingCopy {
        GitWorkingCopy::new(StoreConfig::new(&self.url, BRANCH, dir))
    }
}
