// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for queue replay.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tempfile::tempdir;
use tokio::sync::Notify;

use super::coordinator::{FlushReport, SyncCoordinator};
use super::executor::{ApiExecutor, Executor};
use super::queue::{QueueStore, DEAD_LETTER_SLOT, PENDING_SLOT};
use crate::api::{ApiError, ApiResult};
use crate::storage::{FileSlots, MemorySlots, SlotStorage};
use crate::test_helpers::{contact, draft, FakeApi};
use rolo_core::{ContactPatch, QueuedOperation};

type Coordinator = SyncCoordinator<ApiExecutor<FakeApi>>;

fn coordinator_over(api: &Arc<FakeApi>, storage: Arc<dyn SlotStorage>) -> Coordinator {
    SyncCoordinator::new(
        ApiExecutor::new(Arc::clone(api)),
        QueueStore::new(Arc::clone(&storage), PENDING_SLOT),
        QueueStore::new(storage, DEAD_LETTER_SLOT),
    )
}

fn setup() -> (Arc<FakeApi>, Arc<dyn SlotStorage>, Coordinator) {
    let api = Arc::new(FakeApi::new());
    let storage: Arc<dyn SlotStorage> = Arc::new(MemorySlots::new());
    let coordinator = coordinator_over(&api, Arc::clone(&storage));
    (api, storage, coordinator)
}

#[tokio::test]
async fn empty_flush_is_a_no_op() {
    let (api, _, coordinator) = setup();
    let report = coordinator.flush().await;
    assert_eq!(report, FlushReport::default());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn enqueue_persists_without_network() {
    let (api, storage, coordinator) = setup();
    coordinator.enqueue(QueuedOperation::delete(3)).unwrap();

    assert!(api.calls().is_empty());
    assert_eq!(coordinator.len(), 1);
    assert_eq!(
        storage.read(PENDING_SLOT).unwrap().as_deref(),
        Some(r#"[{"type":"delete","data":{"id":3}}]"#)
    );
}

#[tokio::test]
async fn flush_replays_in_enqueue_order() {
    let (api, _, coordinator) = setup();
    for id in 1..=3 {
        api.seed(contact(id, &format!("C{}", id)));
    }
    coordinator
        .enqueue(QueuedOperation::transaction(2, 5.0, "a"))
        .unwrap();
    coordinator.enqueue(QueuedOperation::delete(1)).unwrap();
    coordinator
        .enqueue(QueuedOperation::update(3, ContactPatch::default()))
        .unwrap();

    let report = coordinator.flush().await;

    assert_eq!(report.delivered, 3);
    assert!(coordinator.is_empty());
    assert_eq!(
        api.calls(),
        vec![
            "POST /contacts/2/transaction?amount=5&note=a",
            "DELETE /contacts/1",
            "PUT /contacts/3",
        ]
    );
}

#[tokio::test]
async fn failed_op_is_requeued_and_later_ops_still_run() {
    let (api, _, coordinator) = setup();
    api.seed(contact(1, "One"));
    api.seed(contact(2, "Two"));
    api.fail_contact(1);

    coordinator
        .enqueue(QueuedOperation::transaction(1, 10.0, "x"))
        .unwrap();
    coordinator
        .enqueue(QueuedOperation::transaction(2, 20.0, "y"))
        .unwrap();

    let report = coordinator.flush().await;
    assert_eq!(report.delivered, 1);
    assert_eq!(report.requeued, 1);
    assert_eq!(api.contact(2).unwrap().last_transaction, 20.0);

    let pending = coordinator.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].contact_id(), Some(1));
    assert_eq!(pending[0].attempts, 1);

    api.heal_contact(1);
    let report = coordinator.flush().await;
    assert_eq!(report.delivered, 1);
    assert!(coordinator.is_empty());
    assert_eq!(api.contact(1).unwrap().last_transaction, 10.0);
}

#[tokio::test]
async fn requeued_ops_keep_their_relative_order() {
    let (api, _, coordinator) = setup();
    api.set_offline(true);
    coordinator.enqueue(QueuedOperation::delete(1)).unwrap();
    coordinator.enqueue(QueuedOperation::delete(2)).unwrap();
    coordinator.flush().await;
    coordinator.enqueue(QueuedOperation::delete(3)).unwrap();

    let ids: Vec<_> = coordinator
        .pending()
        .iter()
        .map(|op| op.contact_id())
        .collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn replayed_transaction_applies_twice() {
    // Transactions are not idempotent: a replay after an unacknowledged
    // success moves the balance again.
    let (api, _, coordinator) = setup();
    api.seed(contact(5, "Five"));
    let op = QueuedOperation::transaction(5, 15.0, "Gift");

    coordinator.enqueue(op.clone()).unwrap();
    coordinator.flush().await;
    coordinator.enqueue(op).unwrap();
    coordinator.flush().await;

    let stored = api.contact(5).unwrap();
    assert_eq!(stored.last_transaction, 30.0);
    assert_eq!(stored.transaction_history.len(), 2);
}

#[tokio::test]
async fn create_then_update_replays_against_same_id() {
    let (api, _, coordinator) = setup();
    coordinator
        .enqueue(QueuedOperation::create(draft("Ana Pop").with_id(11)))
        .unwrap();
    coordinator
        .enqueue(QueuedOperation::update(
            11,
            ContactPatch {
                tag: Some("family".into()),
                ..Default::default()
            },
        ))
        .unwrap();

    let report = coordinator.flush().await;

    assert_eq!(report.delivered, 2);
    assert_eq!(api.calls(), vec!["POST /contacts", "PUT /contacts/11"]);
    assert_eq!(api.contact(11).unwrap().tag.as_deref(), Some("family"));
}

#[tokio::test]
async fn validation_rejection_is_dead_lettered() {
    let (api, _, coordinator) = setup();
    api.fail_next(ApiError::Validation {
        status: 422,
        body: "phone: invalid".into(),
    });
    coordinator
        .enqueue(QueuedOperation::create(draft("Bad Phone")))
        .unwrap();
    coordinator.enqueue(QueuedOperation::delete(1)).unwrap();

    let report = coordinator.flush().await;

    assert_eq!(report.dead_lettered, 1);
    assert_eq!(report.delivered, 1);
    assert!(coordinator.is_empty());
    assert_eq!(
        coordinator.dead_letters(),
        vec![QueuedOperation::create(draft("Bad Phone"))]
    );
}

#[tokio::test]
async fn retry_cap_moves_op_to_dead_letters() {
    let api = Arc::new(FakeApi::new());
    let storage: Arc<dyn SlotStorage> = Arc::new(MemorySlots::new());
    let coordinator = coordinator_over(&api, storage).with_max_attempts(Some(2));
    api.set_offline(true);
    coordinator.enqueue(QueuedOperation::delete(9)).unwrap();

    let first = coordinator.flush().await;
    assert_eq!(first.requeued, 1);
    assert_eq!(coordinator.len(), 1);

    let second = coordinator.flush().await;
    assert_eq!(second.dead_lettered, 1);
    assert!(coordinator.is_empty());

    let dead = coordinator.dead_letters();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].attempts, 2);
}

#[tokio::test]
async fn without_cap_failures_requeue_forever() {
    let (api, _, coordinator) = setup();
    api.set_offline(true);
    coordinator.enqueue(QueuedOperation::delete(9)).unwrap();

    for _ in 0..10 {
        assert_eq!(coordinator.flush().await.requeued, 1);
    }
    assert_eq!(coordinator.pending()[0].attempts, 10);
    assert!(coordinator.dead_letters().is_empty());
}

#[tokio::test]
async fn queue_survives_restart() {
    let dir = tempdir().unwrap();
    let api = Arc::new(FakeApi::new());
    api.seed(contact(4, "Four"));

    {
        let storage: Arc<dyn SlotStorage> = Arc::new(FileSlots::open(dir.path()).unwrap());
        let coordinator = coordinator_over(&api, storage);
        coordinator
            .enqueue(QueuedOperation::transaction(4, 7.5, "Coffee"))
            .unwrap();
    }

    let storage: Arc<dyn SlotStorage> = Arc::new(FileSlots::open(dir.path()).unwrap());
    let coordinator = coordinator_over(&api, storage);
    assert_eq!(coordinator.len(), 1);

    let report = coordinator.flush().await;
    assert_eq!(report.delivered, 1);
    assert_eq!(api.contact(4).unwrap().last_transaction, 7.5);
}

#[tokio::test]
async fn failure_count_survives_restart() {
    let storage: Arc<dyn SlotStorage> = Arc::new(MemorySlots::new());
    let api = Arc::new(FakeApi::new());
    api.set_offline(true);

    let coordinator = coordinator_over(&api, Arc::clone(&storage));
    coordinator.enqueue(QueuedOperation::delete(1)).unwrap();
    coordinator.flush().await;
    drop(coordinator);

    let reloaded = coordinator_over(&api, storage);
    assert_eq!(reloaded.pending()[0].attempts, 1);
}

/// Executor that parks every call until released.
#[derive(Default)]
struct ParkedExecutor {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
}

impl Executor for Arc<ParkedExecutor> {
    fn execute<'a>(&'a self, _op: &'a QueuedOperation) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            Ok(())
        })
    }
}

#[tokio::test]
async fn concurrent_flush_is_coalesced() {
    let storage: Arc<dyn SlotStorage> = Arc::new(MemorySlots::new());
    let executor = Arc::new(ParkedExecutor::default());
    let coordinator = Arc::new(SyncCoordinator::new(
        Arc::clone(&executor),
        QueueStore::new(Arc::clone(&storage), PENDING_SLOT),
        QueueStore::new(storage, DEAD_LETTER_SLOT),
    ));
    coordinator.enqueue(QueuedOperation::delete(1)).unwrap();

    let running = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.flush().await })
    };
    executor.started.notified().await;
    assert!(coordinator.is_flushing());

    let second = coordinator.flush().await;
    assert_eq!(second, FlushReport::skipped());

    executor.release.notify_one();
    let first = running.await.unwrap();
    assert_eq!(first.delivered, 1);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    assert!(!coordinator.is_flushing());
}

#[tokio::test]
async fn cancelled_flush_releases_guard() {
    let storage: Arc<dyn SlotStorage> = Arc::new(MemorySlots::new());
    let executor = Arc::new(ParkedExecutor::default());
    let coordinator = SyncCoordinator::new(
        Arc::clone(&executor),
        QueueStore::new(Arc::clone(&storage), PENDING_SLOT),
        QueueStore::new(storage, DEAD_LETTER_SLOT),
    );
    coordinator.enqueue(QueuedOperation::delete(1)).unwrap();

    {
        let flush = coordinator.flush();
        tokio::pin!(flush);
        tokio::select! {
            _ = &mut flush => panic!("flush should be parked"),
            _ = executor.started.notified() => {}
        }
    }

    assert!(!coordinator.is_flushing());
}

fn parked_coordinator() -> (
    Arc<ParkedExecutor>,
    Arc<dyn SlotStorage>,
    Arc<SyncCoordinator<Arc<ParkedExecutor>>>,
) {
    let storage: Arc<dyn SlotStorage> = Arc::new(MemorySlots::new());
    let executor = Arc::new(ParkedExecutor::default());
    let coordinator = Arc::new(SyncCoordinator::new(
        Arc::clone(&executor),
        QueueStore::new(Arc::clone(&storage), PENDING_SLOT),
        QueueStore::new(Arc::clone(&storage), DEAD_LETTER_SLOT),
    ));
    (executor, storage, coordinator)
}

#[tokio::test]
async fn dropped_flush_restores_unsent_operations() {
    let (executor, storage, coordinator) = parked_coordinator();
    coordinator.enqueue(QueuedOperation::delete(1)).unwrap();
    coordinator.enqueue(QueuedOperation::delete(2)).unwrap();

    {
        let flush = coordinator.flush();
        tokio::pin!(flush);
        tokio::select! {
            _ = &mut flush => panic!("flush should be parked"),
            _ = executor.started.notified() => {}
        }
        coordinator.enqueue(QueuedOperation::delete(3)).unwrap();
    }

    assert!(!coordinator.is_flushing());
    assert_eq!(
        coordinator.pending(),
        vec![
            QueuedOperation::delete(1),
            QueuedOperation::delete(2),
            QueuedOperation::delete(3),
        ]
    );
    let persisted = QueueStore::new(storage, PENDING_SLOT).load();
    assert_eq!(persisted, coordinator.pending());
}

#[tokio::test]
async fn flush_or_join_waits_for_running_flush() {
    let (executor, _, coordinator) = parked_coordinator();
    coordinator.enqueue(QueuedOperation::delete(1)).unwrap();

    let running = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.flush().await })
    };
    executor.started.notified().await;

    let (joined, ()) = tokio::join!(coordinator.flush_or_join(), async {
        executor.release.notify_one();
    });

    let first = running.await.unwrap();
    assert_eq!(first.delivered, 1);
    assert_eq!(joined, first);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn flush_or_join_flushes_when_idle() {
    let (api, _, coordinator) = setup();
    api.seed(contact(1, "One"));
    coordinator.enqueue(QueuedOperation::delete(1)).unwrap();

    let report = coordinator.flush_or_join().await;

    assert_eq!(report.delivered, 1);
    assert!(!report.skipped);
    assert!(coordinator.is_empty());
}

#[test]
fn skipped_report_attempts_nothing() {
    let report = FlushReport::skipped();
    assert!(report.skipped);
    assert_eq!(report.attempted(), 0);
}
