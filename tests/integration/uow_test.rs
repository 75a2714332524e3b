//! Integration tests for the unit-of-work scope.
//!
//! Run with `cargo test -- --ignored` against a live PostgreSQL instance.

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use neowatch_core::observe::EventObserver;
use neowatch_entity::{Asteroid, ThreatAssessment};

#[derive(Default)]
struct CountingObserver {
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl EventObserver for CountingObserver {
    fn on_commit(&self, _scope: &str) {
        self.commits.fetch_add(1, Ordering::SeqCst);
    }

    fn on_rollback(&self, _scope: &str) {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn commit_makes_writes_visible_to_later_scopes() {
    let db = helpers::TestDb::new().await;

    let mut uow = db.scope("writer").await;
    uow.repository::<Asteroid>()
        .unwrap()
        .create(&helpers::asteroid("433", "Eros"))
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let mut reader = db.scope("reader").await;
    let count = reader.repository::<Asteroid>().unwrap().count().await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn dropped_scope_discards_staged_writes() {
    let db = helpers::TestDb::new().await;
    let observer = Arc::new(CountingObserver::default());

    {
        let mut uow = db.scope_with_observer("abandoned", observer.clone()).await;
        uow.repository::<Asteroid>()
            .unwrap()
            .create(&helpers::asteroid("433", "Eros"))
            .await
            .unwrap();
        // Falls out of scope without commit.
    }

    assert_eq!(observer.rollbacks.load(Ordering::SeqCst), 1);
    assert_eq!(observer.commits.load(Ordering::SeqCst), 0);

    let mut reader = db.scope("reader").await;
    let count = reader.repository::<Asteroid>().unwrap().count().await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn explicit_rollback_discards_staged_writes() {
    let db = helpers::TestDb::new().await;
    let observer = Arc::new(CountingObserver::default());

    let mut uow = db.scope_with_observer("undo", observer.clone()).await;
    uow.repository::<Asteroid>()
        .unwrap()
        .create(&helpers::asteroid("433", "Eros"))
        .await
        .unwrap();
    uow.rollback().await.unwrap();

    assert_eq!(observer.rollbacks.load(Ordering::SeqCst), 1);

    let mut reader = db.scope("reader").await;
    let count = reader.repository::<Asteroid>().unwrap().count().await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn repositories_in_one_scope_share_staged_state() {
    let db = helpers::TestDb::new().await;

    let mut uow = db.scope("multi").await;
    uow.repository::<Asteroid>()
        .unwrap()
        .create(&helpers::asteroid("433", "Eros"))
        .await
        .unwrap();

    // A second handle of the same type sees the staged row.
    let count = uow.repository::<Asteroid>().unwrap().count().await.unwrap();
    assert_eq!(count, 1);

    // Writes to other entities ride the same transaction.
    uow.repository::<ThreatAssessment>()
        .unwrap()
        .create(
            &neowatch_core::types::RecordData::new()
                .set("designation", "433")
                .set("threat_level", "low"),
        )
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let mut reader = db.scope("reader").await;
    assert_eq!(reader.repository::<Asteroid>().unwrap().count().await.unwrap(), 1);
    assert_eq!(
        reader
            .repository::<ThreatAssessment>()
            .unwrap()
            .count()
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn commit_emits_observer_event() {
    let db = helpers::TestDb::new().await;
    let observer = Arc::new(CountingObserver::default());

    let uow = db.scope_with_observer("observed", observer.clone()).await;
    uow.commit().await.unwrap();

    assert_eq!(observer.commits.load(Ordering::SeqCst), 1);
    assert_eq!(observer.rollbacks.load(Ordering::SeqCst), 0);
}
