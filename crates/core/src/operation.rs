// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued operations for offline replay.
//!
//! A [`QueuedOperation`] captures exactly what is needed to retry a mutating
//! call later. The persisted form is `{"type": ..., "data": {...}}`, with an
//! optional `attempts` counter that is omitted while zero so that blobs
//! without it load unchanged.
//!
//! Replay semantics per kind:
//!
//! - `create`: at-least-once; a retry after an unacknowledged success creates
//!   a duplicate contact.
//! - `update`: idempotent.
//! - `delete`: idempotent when the remote treats delete-of-missing as success.
//! - `transaction`: NOT idempotent; every replay applies the amount again.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::contact::{ContactDraft, ContactId, ContactPatch};
use crate::error::{Error, Result};

/// The four kinds of mutating call that can be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    Transaction,
}

impl OperationKind {
    /// Returns the string representation used in the persisted queue.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Transaction => "transaction",
        }
    }

    /// Whether executing the same operation twice leaves the same state.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, OperationKind::Update | OperationKind::Delete)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(OperationKind::Create),
            "update" => Ok(OperationKind::Update),
            "delete" => Ok(OperationKind::Delete),
            "transaction" => Ok(OperationKind::Transaction),
            _ => Err(Error::InvalidOperationType(s.to_string())),
        }
    }
}

/// Kind-specific data of a queued operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationPayload {
    /// Create a contact from a draft.
    Create(ContactDraft),

    /// Apply a patch to an existing contact.
    Update { id: ContactId, patch: ContactPatch },

    /// Delete a contact.
    Delete { id: ContactId },

    /// Apply a signed amount with a note to a contact's balance.
    Transaction {
        id: ContactId,
        amount: f64,
        note: String,
    },
}

/// A mutating call waiting to be delivered.
///
/// Immutable once queued; the only field that changes across flushes is the
/// failure counter, and only on the copy that gets re-queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOperation", into = "RawOperation")]
pub struct QueuedOperation {
    pub payload: OperationPayload,
    /// Number of flushes in which delivery of this operation failed.
    pub attempts: u32,
}

impl QueuedOperation {
    /// Creates a fresh operation with no recorded failures.
    pub fn new(payload: OperationPayload) -> Self {
        QueuedOperation {
            payload,
            attempts: 0,
        }
    }

    /// Queues the creation of a contact.
    pub fn create(draft: ContactDraft) -> Self {
        Self::new(OperationPayload::Create(draft))
    }

    /// Queues an update of a contact.
    pub fn update(id: ContactId, patch: ContactPatch) -> Self {
        Self::new(OperationPayload::Update { id, patch })
    }

    /// Queues the deletion of a contact.
    pub fn delete(id: ContactId) -> Self {
        Self::new(OperationPayload::Delete { id })
    }

    /// Queues a balance transaction.
    pub fn transaction(id: ContactId, amount: f64, note: impl Into<String>) -> Self {
        Self::new(OperationPayload::Transaction {
            id,
            amount,
            note: note.into(),
        })
    }

    /// Returns the operation kind.
    pub fn kind(&self) -> OperationKind {
        match &self.payload {
            OperationPayload::Create(_) => OperationKind::Create,
            OperationPayload::Update { .. } => OperationKind::Update,
            OperationPayload::Delete { .. } => OperationKind::Delete,
            OperationPayload::Transaction { .. } => OperationKind::Transaction,
        }
    }

    /// Returns the contact the operation targets, if known.
    ///
    /// Creates only know their target when the draft carries a client id.
    pub fn contact_id(&self) -> Option<ContactId> {
        match &self.payload {
            OperationPayload::Create(draft) => draft.id,
            OperationPayload::Update { id, .. }
            | OperationPayload::Delete { id }
            | OperationPayload::Transaction { id, .. } => Some(*id),
        }
    }

    /// Returns a copy with the failure counter incremented.
    pub fn with_failed_attempt(&self) -> Self {
        QueuedOperation {
            payload: self.payload.clone(),
            attempts: self.attempts.saturating_add(1),
        }
    }
}

impl fmt::Display for QueuedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            OperationPayload::Create(draft) => write!(f, "create {:?}", draft.name),
            OperationPayload::Update { id, .. } => write!(f, "update #{}", id),
            OperationPayload::Delete { id } => write!(f, "delete #{}", id),
            OperationPayload::Transaction { id, amount, note } => {
                write!(f, "transaction #{} {:+} {:?}", id, amount, note)
            }
        }
    }
}

/// Persisted shape of a queued operation.
#[derive(Serialize, Deserialize)]
struct RawOperation {
    #[serde(rename = "type")]
    kind: OperationKind,
    data: serde_json::Value,
    #[serde(default, skip_serializing_if = "is_zero")]
    attempts: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Serialize, Deserialize)]
struct UpdateData {
    id: ContactId,
    #[serde(flatten)]
    patch: ContactPatch,
}

#[derive(Serialize, Deserialize)]
struct DeleteData {
    id: ContactId,
}

#[derive(Serialize, Deserialize)]
struct TransactionData {
    id: ContactId,
    amount: f64,
    #[serde(default = "default_note")]
    note: String,
}

fn default_note() -> String {
    crate::contact::DEFAULT_TRANSACTION_NOTE.to_string()
}

impl TryFrom<RawOperation> for QueuedOperation {
    type Error = Error;

    fn try_from(raw: RawOperation) -> Result<Self> {
        let kind = raw.kind;
        let invalid = |e: serde_json::Error| Error::InvalidPayload {
            kind: kind.as_str(),
            reason: e.to_string(),
        };

        let payload = match kind {
            OperationKind::Create => {
                OperationPayload::Create(serde_json::from_value(raw.data).map_err(invalid)?)
            }
            OperationKind::Update => {
                let data: UpdateData = serde_json::from_value(raw.data).map_err(invalid)?;
                OperationPayload::Update {
                    id: data.id,
                    patch: data.patch,
                }
            }
            OperationKind::Delete => {
                let data: DeleteData = serde_json::from_value(raw.data).map_err(invalid)?;
                OperationPayload::Delete { id: data.id }
            }
            OperationKind::Transaction => {
                let data: TransactionData = serde_json::from_value(raw.data).map_err(invalid)?;
                OperationPayload::Transaction {
                    id: data.id,
                    amount: data.amount,
                    note: data.note,
                }
            }
        };

        Ok(QueuedOperation {
            payload,
            attempts: raw.attempts,
        })
    }
}

impl From<QueuedOperation> for RawOperation {
    fn from(op: QueuedOperation) -> Self {
        let kind = op.kind();
        // Plain data structs with string keys; serialization cannot fail.
        let data = match op.payload {
            OperationPayload::Create(draft) => serde_json::to_value(draft),
            OperationPayload::Update { id, patch } => serde_json::to_value(UpdateData { id, patch }),
            OperationPayload::Delete { id } => serde_json::to_value(DeleteData { id }),
            OperationPayload::Transaction { id, amount, note } => {
                serde_json::to_value(TransactionData { id, amount, note })
            }
        }
        .unwrap_or(serde_json::Value::Null);

        RawOperation {
            kind,
            data,
            attempts: op.attempts,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
