// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for rolo-core operations.

use thiserror::Error;

/// All possible errors that can occur in rolo-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid operation type: '{0}'\n  hint: valid types are: create, update, delete, transaction")]
    InvalidOperationType(String),

    #[error("invalid event type: '{0}'\n  hint: valid types are: new_contact, update_contact, delete_contact, new_transaction")]
    InvalidEventType(String),

    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for rolo-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
