// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Owns the offline queue and drives its replay.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use rolo_core::QueuedOperation;
use serde::Serialize;
use tokio::sync::Notify;

use super::executor::Executor;
use super::queue::{OperationQueue, QueueStore};
use crate::storage::StorageResult;

/// Outcome of a single [`SyncCoordinator::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Operations accepted by the remote.
    pub delivered: usize,
    /// Operations that failed and went back to the queue.
    pub requeued: usize,
    /// Operations moved to the dead-letter slot.
    pub dead_lettered: usize,
    /// Another flush was already running; nothing was attempted.
    pub skipped: bool,
}

impl FlushReport {
    /// Report for a flush that was coalesced into one already in flight.
    pub fn skipped() -> Self {
        FlushReport {
            skipped: true,
            ..Default::default()
        }
    }

    /// Number of operations taken from the queue.
    pub fn attempted(&self) -> usize {
        self.delivered + self.requeued + self.dead_lettered
    }
}

/// Holds the in-progress flag and the part of a batch not yet settled.
///
/// Dropping it, including when the flush future is dropped mid-way, puts
/// unsettled operations back at the front of the queue, records the report
/// and then clears the flag.
struct FlushGuard<'a, E: Executor> {
    coordinator: &'a SyncCoordinator<E>,
    remaining: VecDeque<QueuedOperation>,
    report: FlushReport,
}

impl<E: Executor> Drop for FlushGuard<'_, E> {
    fn drop(&mut self) {
        if !self.remaining.is_empty() {
            let ops: Vec<_> = self.remaining.drain(..).collect();
            tracing::warn!("flush interrupted, restoring {} operations", ops.len());
            if let Err(e) = self.coordinator.lock_queue().restore(ops) {
                tracing::error!("failed to restore interrupted flush: {}", e);
            }
        }
        *self
            .coordinator
            .last_report
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = self.report;
        self.coordinator.flushing.store(false, Ordering::Release);
        self.coordinator.idle.notify_waiters();
    }
}

/// Queues operations that could not be delivered and replays them on demand.
pub struct SyncCoordinator<E: Executor> {
    executor: E,
    queue: Mutex<OperationQueue>,
    dead_letters: QueueStore,
    max_attempts: Option<u32>,
    flushing: AtomicBool,
    idle: Notify,
    last_report: Mutex<FlushReport>,
}

impl<E: Executor> SyncCoordinator<E> {
    /// Create a coordinator, loading any operations persisted by a previous run.
    pub fn new(executor: E, store: QueueStore, dead_letters: QueueStore) -> Self {
        SyncCoordinator {
            executor,
            queue: Mutex::new(OperationQueue::load(store)),
            dead_letters,
            max_attempts: None,
            flushing: AtomicBool::new(false),
            idle: Notify::new(),
            last_report: Mutex::new(FlushReport::default()),
        }
    }

    /// Dead-letter operations once they have failed `max` flushes.
    pub fn with_max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    fn lock_queue(&self) -> MutexGuard<'_, OperationQueue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an operation and persist the queue.
    pub fn enqueue(&self, op: QueuedOperation) -> StorageResult<()> {
        tracing::debug!("queueing {}", op);
        self.lock_queue().append(op)
    }

    /// Snapshot of queued operations in replay order.
    pub fn pending(&self) -> Vec<QueuedOperation> {
        self.lock_queue().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock_queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_queue().is_empty()
    }

    /// Operations that will not be retried.
    pub fn dead_letters(&self) -> Vec<QueuedOperation> {
        self.dead_letters.load()
    }

    /// Whether a flush is running right now.
    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::Acquire)
    }

    /// Replay every queued operation once, in order.
    ///
    /// The queue is emptied and persisted before the first call goes out.
    /// Failed operations are appended back behind anything queued meanwhile
    /// and the flush moves on. If the flush is dropped before it finishes,
    /// the operations it had not settled go back to the front of the queue.
    /// A call made while another flush is running returns
    /// [`FlushReport::skipped`] immediately.
    pub async fn flush(&self) -> FlushReport {
        if self
            .flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("flush already in progress");
            return FlushReport::skipped();
        }
        let mut guard = FlushGuard {
            coordinator: self,
            remaining: VecDeque::new(),
            report: FlushReport::default(),
        };

        let drained = self.lock_queue().drain_all();
        guard.remaining = match drained {
            Ok(batch) => batch.into(),
            Err(e) => {
                tracing::warn!("cannot flush: failed to persist drained queue: {}", e);
                return guard.report;
            }
        };
        if guard.remaining.is_empty() {
            return guard.report;
        }
        tracing::info!("flushing {} queued operations", guard.remaining.len());

        // An operation leaves `remaining` only once its call has finished.
        while let Some(op) = guard.remaining.front().cloned() {
            let outcome = self.executor.execute(&op).await;
            guard.remaining.pop_front();
            match outcome {
                Ok(()) => {
                    tracing::debug!("delivered {}", op);
                    guard.report.delivered += 1;
                }
                Err(e) if e.is_retryable() => {
                    let retry = op.with_failed_attempt();
                    if self.max_attempts.is_some_and(|max| retry.attempts >= max) {
                        tracing::warn!(
                            "giving up on {} after {} attempts: {}",
                            op,
                            retry.attempts,
                            e
                        );
                        self.dead_letter(retry);
                        guard.report.dead_lettered += 1;
                    } else {
                        tracing::debug!("{} failed, requeueing: {}", op, e);
                        if let Err(se) = self.lock_queue().append(retry) {
                            tracing::error!("failed to requeue {}: {}", op, se);
                        }
                        guard.report.requeued += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("{} rejected: {}", op, e);
                    self.dead_letter(op);
                    guard.report.dead_lettered += 1;
                }
            }
        }

        let report = guard.report;
        tracing::info!(
            "flush done: {} delivered, {} requeued, {} dead-lettered",
            report.delivered,
            report.requeued,
            report.dead_lettered
        );
        report
    }

    /// Flush, or when a flush is already running wait for it and return
    /// its report instead.
    pub async fn flush_or_join(&self) -> FlushReport {
        let idle = self.idle.notified();
        tokio::pin!(idle);
        // Registered before the flag is checked, so the wake-up cannot be missed.
        idle.as_mut().enable();

        let report = self.flush().await;
        if !report.skipped {
            return report;
        }
        tracing::debug!("joining the flush in progress");
        idle.await;
        *self.last_report.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dead_letter(&self, op: QueuedOperation) {
        if let Err(e) = self.dead_letters.push(op) {
            tracing::error!(
                "failed to write dead letter to '{}': {}",
                self.dead_letters.slot(),
                e
            );
        }
    }
}
