//! Test doubles for the shared store, the lock and the clock
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sheetsync_core::{Revision, SyncPolicy, WaitPolicy};
use sheetsync_engine::source::MemorySource;
use sheetsync_engine::{Clock, Result, SystemClock};
use sheetsync_store::{SnapshotStore, TryAcquire};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DATASET_URL: &str = "memory://course/roster";

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

pub fn roster_source() -> MemorySource {
    MemorySource::new().with_sheet(
        DATASET_URL,
        "Roster",
        vec![row(&["Student ID", "Room"]), row(&["100", "A1"]), row(&["200", "B2"])],
    )
}

/// Short polling for tests on real time
pub fn fast_policy() -> SyncPolicy {
    SyncPolicy {
        wait: WaitPolicy {
            poll_interval: Duration::from_millis(10),
            freshness_window: Duration::from_secs(300),
            max_attempts: 1000,
        },
        ..SyncPolicy::default()
    }
}

// ===== Clock =====

/// Time that only moves when someone sleeps
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
    sleeps: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
            sleeps: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn start() -> Self {
        Self::at(Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap())
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.advance(duration);
    }
}

#[derive(Clone)]
pub enum TestClock {
    System,
    Manual(ManualClock),
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        match self {
            TestClock::System => SystemClock.now(),
            TestClock::Manual(clock) => clock.now(),
        }
    }

    fn sleep(&self, duration: Duration) {
        match self {
            TestClock::System => SystemClock.sleep(duration),
            TestClock::Manual(clock) => clock.sleep(duration),
        }
    }
}

// ===== Shared remote =====

#[derive(Clone, Debug)]
pub struct Published {
    pub revision: Revision,
    pub files: BTreeMap<String, Vec<u8>>,
}

#[derive(Default)]
struct RemoteState {
    history: Vec<Published>,
    lock_refs: HashSet<String>,
    pulls: u32,
    lock_attempts: u32,
}

/// An append-only published history plus a set of lock refs
#[derive(Clone, Default)]
pub struct SharedRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl SharedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish directly, as some earlier writer would have
    pub fn seed(&self, committed_at: DateTime<Utc>, files: &[(&str, &str)]) -> Revision {
        let files = files
            .iter()
            .map(|(name, content)| (name.to_string(), content.as_bytes().to_vec()))
            .collect();
        self.append(committed_at, files)
    }

    fn append(&self, committed_at: DateTime<Utc>, files: BTreeMap<String, Vec<u8>>) -> Revision {
        let mut state = self.state.lock().unwrap();
        let revision = Revision::new(format!("{:040x}", state.history.len() + 1), committed_at);
        state.history.push(Published {
            revision: revision.clone(),
            files,
        });
        revision
    }

    /// Latest revision committed no later than `now`
    fn visible_at(&self, now: DateTime<Utc>) -> Option<Published> {
        let mut state = self.state.lock().unwrap();
        state.pulls += 1;
        state
            .history
            .iter()
            .rev()
            .find(|p| p.revision.committed_at <= now)
            .cloned()
    }

    pub fn publishes(&self) -> usize {
        self.state.lock().unwrap().history.len()
    }

    pub fn latest(&self) -> Option<Published> {
        self.state.lock().unwrap().history.last().cloned()
    }

    pub fn pulls(&self) -> u32 {
        self.state.lock().unwrap().pulls
    }

    pub fn lock_attempts(&self) -> u32 {
        self.state.lock().unwrap().lock_attempts
    }

    pub fn take_lock(&self, name: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        state.lock_attempts += 1;
        state.lock_refs.insert(name.to_string())
    }
}

/// Working copy of a `SharedRemote`
pub struct FakeStore {
    remote: SharedRemote,
    dir: PathBuf,
    head: Mutex<Option<Revision>>,
    clock: TestClock,
}

impl FakeStore {
    pub fn new(remote: &SharedRemote, dir: &Path, clock: TestClock) -> Self {
        fs::create_dir_all(dir).unwrap();
        Self {
            remote: remote.clone(),
            dir: dir.to_path_buf(),
            head: Mutex::new(None),
            clock,
        }
    }

    fn clear_dir(&self) {
        for entry in fs::read_dir(&self.dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_file() {
                fs::remove_file(path).unwrap();
            }
        }
    }
}

impl SnapshotStore for FakeStore {
    fn pull(&self) -> Result<()> {
        self.clear_dir();
        let published = self.remote.visible_at(self.clock.now());
        if let Some(published) = &published {
            for (name, content) in &published.files {
                fs::write(self.dir.join(name), content).unwrap();
            }
        }
        *self.head.lock().unwrap() = published.map(|p| p.revision);
        Ok(())
    }

    fn publish(&self, _label: &str) -> Result<Revision> {
        let mut files = BTreeMap::new();
        for entry in fs::read_dir(&self.dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_file() {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                files.insert(name, fs::read(&path).unwrap());
            }
        }
        let revision = self.remote.append(self.clock.now(), files);
        *self.head.lock().unwrap() = Some(revision.clone());
        Ok(revision)
    }

    fn head_revision(&self) -> Result<Option<Revision>> {
        Ok(self.head.lock().unwrap().clone())
    }

    fn working_dir(&self) -> &Path {
        &self.dir
    }
}

/// Lock whose round name is fixed by the test
pub struct FakeLock {
    remote: SharedRemote,
    round: String,
}

impl FakeLock {
    pub fn new(remote: &SharedRemote, round: &str) -> Self {
        Self {
            remote: remote.clone(),
            round: round.to_string(),
        }
    }
}

impl TryAcquire for FakeLock {
    fn try_acquire(&self) -> Result<bool> {
        Ok(self.remote.take_lock(&self.round))
    }
}

// ===== Git fixtures =====

pub fn git_available() -> bool {
    sheetsync_store::git::git_available()
}

/// An empty bare repository; returns its path as the remote URL
pub fn bare_remote(root: &Path) -> String {
    let bare = root.join("remote.git");
    fs::create_dir_all(&bare).unwrap();
    let status = Command::new("git")
        .arg("-C")
        .arg(&bare)
        .args(["init", "-q", "--bare"])
        .status()
        .unwrap();
    assert!(status.success());
    bare.display().to_string()
}
