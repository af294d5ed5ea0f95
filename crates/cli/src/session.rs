// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session credential lookup.
//!
//! The bearer token is owned by whoever signs the user in. This crate never
//! caches it: every outbound request asks the [`TokenSource`] again, so a
//! token refreshed elsewhere takes effect on the next call.

use std::sync::Arc;

use crate::storage::{SlotStorage, StorageResult};

/// Slot holding the session bearer token.
pub const TOKEN_SLOT: &str = "token";

/// Source of the bearer credential attached to outbound requests.
pub trait TokenSource: Send + Sync {
    /// The current token, or `None` for anonymous requests.
    fn bearer_token(&self) -> Option<String>;
}

/// Reads the token from the session slot on every call.
#[derive(Clone)]
pub struct SessionToken {
    storage: Arc<dyn SlotStorage>,
}

impl SessionToken {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        SessionToken { storage }
    }

    /// Store a token in the session slot.
    pub fn store(&self, token: &str) -> StorageResult<()> {
        self.storage.write(TOKEN_SLOT, token.trim())
    }

    /// Remove the token from the session slot.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.remove(TOKEN_SLOT)
    }
}

impl TokenSource for SessionToken {
    fn bearer_token(&self) -> Option<String> {
        match self.storage.read(TOKEN_SLOT) {
            Ok(Some(token)) if !token.trim().is_empty() => Some(token.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("failed to read session token: {}", e);
                None
            }
        }
    }
}

/// A fixed token, for tests and one-off invocations.
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
