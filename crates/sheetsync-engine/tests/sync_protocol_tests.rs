//! The sync protocol against an in-memory shared store

mod common;

use chrono::Duration as ChronoDuration;
use common::*;
use sheetsync_core::logging_facility::test_capture::init_test_capture;
use sheetsync_core::SyncPolicy;
use sheetsync_engine::{SyncOutcome, SyncPhase, Syncer};
use sheetsync_store::{SnapshotStore, TableDir};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

type ManualSyncer = Syncer<FakeStore, FakeLock, sheetsync_engine::source::MemorySource, ManualClock>;

fn manual_syncer(remote: &SharedRemote, dir: &std::path::Path, clock: &ManualClock, round: &str) -> ManualSyncer {
    let store = FakeStore::new(remote, dir, TestClock::Manual(clock.clone()));
    let lock = FakeLock::new(remote, round);
    Syncer::new(store, lock, roster_source(), DATASET_URL, SyncPolicy::default()).with_clock(clock.clone())
}

#[test]
fn test_winner_refreshes_and_publishes_once() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");

    let outcome = syncer.sync().unwrap();

    let SyncOutcome::Refreshed(report) = &outcome else {
        panic!("expected a refresh, got {outcome:?}");
    };
    assert_eq!(remote.publishes(), 1);
    assert_eq!(syncer.phase(), Some(SyncPhase::Fresh));
    assert_eq!(report.manifest.sheet_names().collect::<Vec<_>>(), vec!["Roster"]);
    assert_eq!(syncer.source().open_count(), 1);
    assert_eq!(clock.sleeps(), 0);
}

#[test]
fn test_loser_waits_for_fresh_revision() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    remote.seed(clock.now_minus(10), &[("Roster.csv", "Student ID,Room\n100,A1\n")]);
    remote.take_lock("lock-a");
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");

    let outcome = syncer.sync().unwrap();

    let SyncOutcome::Waited(report) = outcome else {
        panic!("expected to wait");
    };
    assert_eq!(report.attempts, 1);
    assert_eq!(syncer.source().open_count(), 0);
    assert_eq!(remote.publishes(), 1);
    assert!(work.path().join("Roster.csv").exists());
}

#[test]
fn test_budget_exhaustion_is_fatal_and_visible() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    remote.seed(clock.now_minus(3600), &[("Roster.csv", "Student ID\n100\n")]);
    remote.take_lock("lock-a");
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");
    let pulls_before = remote.pulls();

    let err = syncer.sync().unwrap_err();

    assert_eq!(err.code(), "ERR_TIMEOUT");
    assert!(err.is_user_visible());
    assert!(err.message().contains("Please contact course staff."));
    assert!(err.sync_id().is_some());
    assert_eq!(remote.pulls() - pulls_before, 60);
    assert_eq!(clock.sleeps(), 60);
    assert_eq!(syncer.phase(), Some(SyncPhase::TimedOut));
}

#[test]
fn test_unpublished_remote_times_out_for_loser() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    remote.take_lock("lock-a");
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");

    let err = syncer.sync().unwrap_err();
    assert_eq!(err.code(), "ERR_TIMEOUT");
}

#[test]
fn test_refresh_failure_publishes_nothing() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    let old = remote.seed(clock.now_minus(3600), &[("Roster.csv", "Student ID\n100\n")]);
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");
    syncer.source().set_failure(Some("quota exhausted"));

    let err = syncer.sync().unwrap_err();

    assert_eq!(err.code(), "ERR_EXTERNAL_SERVICE");
    assert!(!err.is_user_visible());
    assert_eq!(remote.publishes(), 1);
    assert_eq!(remote.latest().unwrap().revision, old);
    assert_eq!(syncer.phase(), Some(SyncPhase::Held));
}

#[test]
fn test_invalid_sheet_title_aborts_before_touching_files() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    remote.seed(clock.now_minus(3600), &[("Roster.csv", "Student ID\n100\n")]);
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");
    syncer.source().set_sheet(DATASET_URL, "Q1/Q2", vec![row(&["x"])]);

    let err = syncer.sync().unwrap_err();

    assert_eq!(err.code(), "ERR_EXTERNAL_SERVICE");
    assert!(!err.is_user_visible());
    assert_eq!(err.sheet(), Some("Q1/Q2"));
    assert_eq!(remote.publishes(), 1);
    assert!(work.path().join("Roster.csv").exists());
}

#[test]
fn test_hidden_sheet_title_is_internal_error() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");
    syncer.source().set_sheet(DATASET_URL, ".Archive", vec![row(&["x"])]);

    let err = syncer.sync().unwrap_err();

    assert!(!err.is_user_visible());
    assert!(err.message().contains(".Archive"));
    assert_eq!(remote.publishes(), 0);
}

#[test]
fn test_stale_sheets_are_removed() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    let first = manual_syncer(&remote, work.path(), &clock, "lock-a");
    first.source().set_sheet(DATASET_URL, "Old", vec![row(&["x"])]);
    first.sync().unwrap();
    assert!(work.path().join("Old.csv").exists());

    clock.advance(std::time::Duration::from_secs(60));
    let second = manual_syncer(&remote, work.path(), &clock, "lock-b");
    let outcome = second.sync().unwrap();

    let SyncOutcome::Refreshed(report) = outcome else {
        panic!("second round should refresh");
    };
    assert_eq!(report.removed, 2);
    let published = remote.latest().unwrap();
    assert_eq!(published.files.keys().collect::<Vec<_>>(), vec!["Roster.csv"]);
    assert!(!work.path().join("Old.csv").exists());
}

#[test]
fn test_snapshot_matches_one_round_of_fetches() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");
    syncer
        .source()
        .set_sheet(DATASET_URL, "Grades", vec![row(&["Student ID", "Score"]), row(&["100", "9, of 10"])]);

    syncer.sync().unwrap();

    let tables = TableDir::new(syncer.store().working_dir());
    assert_eq!(tables.list().unwrap(), vec!["Grades", "Roster"]);
    let fetched = sheetsync_engine::refresh::fetch_all(syncer.source(), DATASET_URL).unwrap();
    for table in fetched {
        assert_eq!(tables.read(&table.name).unwrap(), table);
    }
}

#[test]
fn test_revision_label_carries_manifest_digest() {
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");

    let SyncOutcome::Refreshed(report) = syncer.sync().unwrap() else {
        panic!("expected a refresh");
    };
    let again = manual_syncer(&remote, &work.path().join("other"), &clock, "lock-b");
    let SyncOutcome::Refreshed(second) = again.sync().unwrap() else {
        panic!("expected a refresh");
    };

    assert_eq!(report.manifest.digest, second.manifest.digest);
    assert_ne!(report.revision, second.revision);
}

#[test]
fn test_sync_logs_lifecycle() {
    let capture = init_test_capture();
    let remote = SharedRemote::new();
    let work = TempDir::new().unwrap();
    let clock = ManualClock::start();
    let syncer = manual_syncer(&remote, work.path(), &clock, "lock-a");

    syncer.sync().unwrap();

    capture.assert_event_exists("sync", "start");
    capture.assert_event_exists("refresh", "end");
    let ends = capture.events_for("sync", "end");
    assert!(ends.iter().any(|e| e.field("refreshed") == Some("true")));
}

#[test]
fn test_mutual_exclusion_under_concurrency() {
    const CALLERS: usize = 8;
    let remote = SharedRemote::new();
    let source = roster_source();
    let work = Arc::new(TempDir::new().unwrap());
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let remote = remote.clone();
            let source = source.clone();
            let work = Arc::clone(&work);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let dir = work.path().join(format!("caller-{i}"));
                let store = FakeStore::new(&remote, &dir, TestClock::System);
                let lock = FakeLock::new(&remote, "lock-race");
                let syncer = Syncer::new(store, lock, source, DATASET_URL, fast_policy());
                barrier.wait();
                let outcome = syncer.sync().unwrap();
                let record = sheetsync_engine::reader::lookup(&dir, "Roster", "Student ID", "200").unwrap();
                assert_eq!(record.get("Room"), Some("B2"));
                outcome.refreshed()
            })
        })
        .collect();

    let refreshed = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|r| *r)
        .count();

    assert_eq!(refreshed, 1);
    assert_eq!(remote.publishes(), 1);
    assert_eq!(source.open_count(), 1);
    assert_eq!(remote.lock_attempts() as usize, CALLERS);
}

trait NowMinus {
    fn now_minus(&self, secs: i64) -> chrono::DateTime<chrono::Utc>;
}

impl NowMinus for ManualClock {
    fn now_minus(&self, secs: i64) -> chrono::DateTime<chrono::Utc> {
        sheetsync_engine::Clock::now(self) - ChronoDuration::seconds(secs)
    }
}
