// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rolo-core: Shared types for the rolo contact client.
//!
//! This crate provides the contact model, the queued operation format that
//! is persisted while offline, and the realtime envelope protocol spoken on
//! the push channel. It performs no I/O.

pub mod contact;
pub mod error;
pub mod operation;
pub mod protocol;

pub use contact::{
    Contact, ContactDraft, ContactId, ContactPage, ContactPatch, ContactQuery, Transaction,
    DEFAULT_TRANSACTION_NOTE,
};
pub use error::{Error, Result};
pub use operation::{OperationKind, OperationPayload, QueuedOperation};
pub use protocol::{DeletedContact, Envelope, EventType, TransactionEvent};
