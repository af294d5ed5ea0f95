// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline operation queue.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Coordinator │────►│  Executor   │────►│ ContactsApi │
//! │ (flush)     │     │  (trait)    │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ QueueStore  │  (slot `pendingOperations`)
//! └─────────────┘
//! ```
//!
//! Delivery is at-least-once: a call that reached the remote but whose
//! response was lost is replayed on the next flush.

mod coordinator;
mod executor;
mod queue;

pub use coordinator::{FlushReport, SyncCoordinator};
pub use executor::{ApiExecutor, Executor};
pub use queue::{OperationQueue, QueueStore, DEAD_LETTER_SLOT, PENDING_SLOT};

#[cfg(test)]
mod coordinator_tests;
