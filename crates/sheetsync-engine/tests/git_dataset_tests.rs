//! End to end over a real bare repository with an in-memory source

mod common;

use common::*;
use sheetsync_core::SyncPolicy;
use sheetsync_engine::source::MemorySource;
use sheetsync_engine::{CachedDataset, SyncOutcome, Syncer};
use sheetsync_store::{GitRefLock, GitWorkingCopy, StoreConfig};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn policy() -> SyncPolicy {
    SyncPolicy {
        lock_round: Duration::from_secs(3600),
        ..fast_policy()
    }
}

fn git_dataset(
    remote_url: &str,
    dir: &Path,
    source: MemorySource,
    policy: SyncPolicy,
) -> CachedDataset<GitWorkingCopy, GitRefLock, MemorySource> {
    let config = StoreConfig::new(remote_url, "master", dir);
    let lock = GitRefLock::new(GitWorkingCopy::new(config.clone()), policy.lock_round)
        .with_remote_pruning(policy.prune_lock_refs);
    let store = GitWorkingCopy::new(config);
    CachedDataset::new(Syncer::new(store, lock, source, DATASET_URL, policy))
}

#[test]
fn test_first_caller_refreshes_second_waits() {
    if !git_available() {
        return;
    }
    let work = TempDir::new().unwrap();
    let url = bare_remote(work.path());
    let source = roster_source();
    let first = git_dataset(&url, &work.path().join("a"), source.clone(), policy());
    let second = git_dataset(&url, &work.path().join("b"), source.clone(), policy());

    let outcome = first.sync().unwrap();
    assert!(matches!(outcome, SyncOutcome::Refreshed(_)));

    let record = second.lookup("Roster", "Student ID", "100").unwrap();
    assert_eq!(record.get("Room"), Some("A1"));
    assert_eq!(source.open_count(), 1);
}

#[test]
fn test_refresh_replaces_published_sheets() {
    if !git_available() {
        return;
    }
    let work = TempDir::new().unwrap();
    let url = bare_remote(work.path());
    let source = roster_source().with_sheet(DATASET_URL, "Extra", vec![row(&["k"])]);
    let pruning = SyncPolicy {
        prune_lock_refs: true,
        ..policy()
    };

    git_dataset(&url, &work.path().join("a"), source.clone(), pruning).sync().unwrap();
    source.remove_sheet(DATASET_URL, "Extra");
    source.set_sheet(
        DATASET_URL,
        "Roster",
        vec![row(&["Student ID", "Room"]), row(&["100", "C3"])],
    );
    // Pruning freed the round, so a second refresh in the same round wins
    let outcome = git_dataset(&url, &work.path().join("b"), source.clone(), pruning)
        .sync()
        .unwrap();
    assert!(outcome.refreshed());

    let reader = git_dataset(&url, &work.path().join("c"), MemorySource::new(), policy());
    let records = reader.read_table("Roster").unwrap();
    assert_eq!(records[0].get("Room"), Some("C3"));
    assert!(!work.path().join("c").join("Extra.csv").exists());
}

#[test]
fn test_concurrent_callers_share_one_refresh() {
    if !git_available() {
        return;
    }
    const CALLERS: usize = 4;
    let work = Arc::new(TempDir::new().unwrap());
    let url = Arc::new(bare_remote(work.path()));
    let source = roster_source();
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let work = Arc::clone(&work);
            let url = Arc::clone(&url);
            let source = source.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let cache = git_dataset(&url, &work.path().join(format!("c{i}")), source, policy());
                barrier.wait();
                let record = cache.lookup("Roster", "Student ID", "200").unwrap();
                assert_eq!(record.get("Room"), Some("B2"));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(source.open_count(), 1);
}
