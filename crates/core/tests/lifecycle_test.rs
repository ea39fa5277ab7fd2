//! End-to-end lifecycle scenarios against the in-memory store.
//!
//! These tests verify that:
//! - Uploads expire one retention window after they were written
//! - Cleanup deletes exactly the expired files and is idempotent
//! - Listings stay scoped to one space and newest first
//! - Stats never fail
//! - Clearing a space is all-or-nothing without rolling back

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::join_all;

use driftbox_core::clock::ManualClock;
use driftbox_core::space::{SpaceError, SpaceService, SpaceStats, UploadFile};
use driftbox_core::storage::{MemoryObjectStore, ObjectStore, StorageConfig, StorageProvider};

struct Harness {
    store: Arc<MemoryObjectStore>,
    clock: Arc<ManualClock>,
    service: Arc<SpaceService>,
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(t0()));
    let store = Arc::new(MemoryObjectStore::new(clock.clone()));
    let service = Arc::new(SpaceService::new(
        store.clone(),
        StorageConfig::new(StorageProvider::Memory),
        clock.clone(),
    ));
    Harness {
        store,
        clock,
        service,
    }
}

fn file(name: &str, size: usize) -> UploadFile {
    UploadFile::new(name, Some("text/plain".to_string()), vec![b'x'; size])
}

#[tokio::test]
async fn upload_list_expire_cleanup() {
    let h = harness();
    h.service.upload_file("S1", file("a.txt", 10)).await.unwrap();

    let files = h.service.list_files("S1").await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "a.txt");
    assert_eq!(files[0].size, 10);
    assert_eq!(files[0].expires_at, t0() + Duration::hours(24));

    h.clock.advance(Duration::hours(25));
    let result = h.service.clean_expired_files(Some("S1")).await.unwrap();
    assert_eq!(result.deleted_count, 1);
    assert_eq!(result.deleted_files, vec!["a.txt"]);

    assert!(h.service.list_files("S1").await.unwrap().is_empty());
}

#[tokio::test]
async fn cleanup_twice_deletes_nothing_the_second_time() {
    let h = harness();
    for name in ["a.txt", "b.txt", "c.txt"] {
        h.service.upload_file("S1", file(name, 3)).await.unwrap();
    }
    h.clock.advance(Duration::hours(30));

    let first = h.service.clean_expired_files(None).await.unwrap();
    assert_eq!(first.deleted_count, 3);

    let second = h.service.clean_expired_files(None).await.unwrap();
    assert_eq!(second.deleted_count, 0);
    assert!(second.deleted_files.is_empty());
}

#[tokio::test]
async fn every_upload_expires_one_day_after_upload() {
    let h = harness();
    for (i, name) in ["a.txt", "b.txt", "c.txt", "d.txt"].iter().enumerate() {
        h.clock.advance(Duration::minutes(17 * i64::try_from(i).unwrap()));
        let stored = h.service.upload_file("S1", file(name, i + 1)).await.unwrap();
        assert_eq!(stored.expires_at - stored.uploaded_at, Duration::hours(24));
    }

    for f in h.service.list_files("S1").await.unwrap() {
        assert_eq!(f.expires_at - f.uploaded_at, Duration::hours(24));
    }
}

#[tokio::test]
async fn listing_is_scoped_and_newest_first() {
    let h = harness();
    for (space, name) in [("S1", "one"), ("S2", "two"), ("S1", "three"), ("S1", "four")] {
        h.service.upload_file(space, file(name, 1)).await.unwrap();
        h.clock.advance(Duration::minutes(5));
    }

    let files = h.service.list_files("S1").await.unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.space_id == "S1"));
    assert!(files.windows(2).all(|w| w[0].uploaded_at >= w[1].uploaded_at));
    assert_eq!(files[0].name, "four");
}

#[tokio::test]
async fn stats_aggregate_two_uploads() {
    let h = harness();
    h.service.upload_file("S1", file("a.txt", 10)).await.unwrap();
    h.clock.advance(Duration::hours(1));
    h.service.upload_file("S1", file("b.txt", 32)).await.unwrap();

    let stats = h.service.get_space_stats("S1").await;
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_size, 42);
    assert_eq!(stats.last_modified, t0() + Duration::hours(1));
}

#[tokio::test]
async fn stats_never_fail() {
    let h = harness();
    h.service.upload_file("S1", file("a.txt", 10)).await.unwrap();
    h.store.fail_list(true);
    h.clock.advance(Duration::minutes(3));

    let stats = h.service.get_space_stats("S1").await;
    assert_eq!(stats, SpaceStats::empty("S1", t0() + Duration::minutes(3)));
}

#[tokio::test]
async fn deleting_missing_key_succeeds() {
    let h = harness();
    h.service.delete_file("spaces/S1/never.txt").await.unwrap();
    h.store.delete("spaces/S1/never.txt").await.unwrap();
}

#[tokio::test]
async fn clear_space_reports_partial_failure_without_rollback() {
    let h = harness();
    for name in ["a.txt", "b.txt", "c.txt"] {
        h.service.upload_file("S1", file(name, 2)).await.unwrap();
    }
    h.store.fail_delete_for("spaces/S1/b.txt");

    let err = h.service.clear_space("S1").await.unwrap_err();
    match err {
        SpaceError::AggregateDelete { failed, attempted } => {
            assert_eq!(failed, vec!["spaces/S1/b.txt"]);
            assert_eq!(attempted, 3);
        }
        other => panic!("expected aggregate delete error, got {other}"),
    }

    let remaining: Vec<String> = h
        .service
        .list_files("S1")
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(remaining, vec!["b.txt"]);
}

#[tokio::test]
async fn concurrent_cleanups_are_safe() {
    let h = harness();
    for i in 0..20 {
        h.service
            .upload_file("S1", file(&format!("f{i}.bin"), 4))
            .await
            .unwrap();
    }
    h.clock.advance(Duration::hours(48));

    let runs = join_all((0..4).map(|_| {
        let service = Arc::clone(&h.service);
        async move { service.clean_expired_files(Some("S1")).await }
    }))
    .await;

    let total: usize = runs.into_iter().map(|r| r.unwrap().deleted_count).sum();
    assert!(total >= 20);
    assert!(h.store.is_empty());
}
