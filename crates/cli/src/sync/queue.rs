// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage for queued operations.
//!
//! The whole queue lives in one named slot as a JSON array, rewritten in
//! full after every mutation. [`OperationQueue`] keeps the in-memory copy and
//! only adopts a new state once it has been persisted, so a failed write
//! leaves both copies at the previous state.

use std::sync::Arc;

use rolo_core::QueuedOperation;

use crate::storage::{SlotStorage, StorageError, StorageResult};

/// Default slot for pending operations.
pub const PENDING_SLOT: &str = "pendingOperations";

/// Default slot for operations that will not be retried.
pub const DEAD_LETTER_SLOT: &str = "deadOperations";

/// Loads and saves a list of operations in a single slot.
#[derive(Clone)]
pub struct QueueStore {
    storage: Arc<dyn SlotStorage>,
    slot: String,
}

impl QueueStore {
    pub fn new(storage: Arc<dyn SlotStorage>, slot: impl Into<String>) -> Self {
        QueueStore {
            storage,
            slot: slot.into(),
        }
    }

    /// Name of the backing slot.
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Load the persisted list.
    ///
    /// Never fails: a missing slot, an unreadable slot and a corrupt blob all
    /// yield an empty list. A corrupt blob is copied aside to
    /// `<slot>_corrupt` before it gets overwritten by the next save.
    pub fn load(&self) -> Vec<QueuedOperation> {
        let blob = match self.storage.read(&self.slot) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read queue slot '{}': {}", self.slot, e);
                return Vec::new();
            }
        };

        if blob.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str(&blob) {
            Ok(ops) => ops,
            Err(e) => {
                tracing::warn!(
                    "discarding corrupt queue slot '{}' ({} bytes): {}",
                    self.slot,
                    blob.len(),
                    e
                );
                let aside = format!("{}_corrupt", self.slot);
                if let Err(e) = self.storage.write(&aside, &blob) {
                    tracing::warn!("failed to preserve corrupt queue in '{}': {}", aside, e);
                }
                Vec::new()
            }
        }
    }

    /// Overwrite the persisted list.
    ///
    /// A blob that [`load`](Self::load) could not parse is never written;
    /// the previous state stays in place instead.
    pub fn save(&self, ops: &[QueuedOperation]) -> StorageResult<()> {
        let blob = serde_json::to_string(ops)?;
        if let Err(e) = serde_json::from_str::<Vec<QueuedOperation>>(&blob) {
            return Err(StorageError::Unreadable {
                slot: self.slot.clone(),
                reason: e.to_string(),
            });
        }
        self.storage.write(&self.slot, &blob)
    }

    /// Append one operation to the persisted list.
    pub fn push(&self, op: QueuedOperation) -> StorageResult<()> {
        let mut ops = self.load();
        ops.push(op);
        self.save(&ops)
    }
}

/// In-memory FIFO queue mirrored to a [`QueueStore`].
pub struct OperationQueue {
    ops: Vec<QueuedOperation>,
    store: QueueStore,
}

impl OperationQueue {
    /// Load the queue from its store.
    pub fn load(store: QueueStore) -> Self {
        let ops = store.load();
        if !ops.is_empty() {
            tracing::info!(
                "loaded {} pending operations from '{}'",
                ops.len(),
                store.slot()
            );
        }
        OperationQueue { ops, store }
    }

    /// Append to the back of the queue.
    pub fn append(&mut self, op: QueuedOperation) -> StorageResult<()> {
        let mut next = Vec::with_capacity(self.ops.len() + 1);
        next.extend(self.ops.iter().cloned());
        next.push(op);
        self.store.save(&next)?;
        self.ops = next;
        Ok(())
    }

    /// Put operations back at the front of the queue, ahead of anything
    /// appended since they were taken.
    pub fn restore(&mut self, ops: Vec<QueuedOperation>) -> StorageResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut next = ops;
        next.extend(self.ops.iter().cloned());
        self.store.save(&next)?;
        self.ops = next;
        Ok(())
    }

    /// Take every queued operation, leaving the queue empty.
    ///
    /// The empty queue is persisted before the batch is handed out.
    pub fn drain_all(&mut self) -> StorageResult<Vec<QueuedOperation>> {
        if self.ops.is_empty() {
            return Ok(Vec::new());
        }
        self.store.save(&[])?;
        Ok(std::mem::take(&mut self.ops))
    }

    /// Snapshot of the queued operations in replay order.
    pub fn snapshot(&self) -> Vec<QueuedOperation> {
        self.ops.clone()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
