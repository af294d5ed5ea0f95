// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::api::ApiError;
use crate::channel::TransportError;
use crate::storage::StorageError;

/// All possible errors surfaced by the rolo client.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote call failed but the change is queued for replay.
    #[error("{source}\n  hint: the change was saved offline and will be sent once the server is reachable")]
    Queued { source: ApiError },

    #[error("{0}")]
    Api(ApiError),

    #[error("{source}\n  hint: no cached contacts are available; connect once to populate the cache")]
    NoCache { source: ApiError },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid amount: {0}\n  hint: amounts must be finite numbers, e.g. 25 or -12.5")]
    InvalidAmount(f64),

    #[error("nothing to update\n  hint: pass at least one field, e.g. --name or --tag")]
    EmptyPatch,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("realtime channel error: {0}")]
    Transport(#[from] TransportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("no state directory available\n  hint: pass --state-dir or set state_dir in rolo.toml")]
    NoStateDir,
}

/// A specialized Result type for rolo operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Self {
        Error::Api(e)
    }
}

impl From<rolo_core::Error> for Error {
    fn from(e: rolo_core::Error) -> Self {
        match e {
            rolo_core::Error::Json(e) => Error::Json(e),
            other => Error::InvalidInput(other.to_string()),
        }
    }
}

impl Error {
    /// Whether the failed change was queued for replay.
    pub fn is_queued(&self) -> bool {
        matches!(self, Error::Queued { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
