// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote contacts API.
//!
//! [`ContactsApi`] is the seam between the sync machinery and the network.
//! [`HttpApi`] talks to the real service; tests substitute in-memory fakes.
//!
//! Every call is one request/response pair. Mutating calls answer with the
//! canonical created or updated resource.

mod http;
mod routes;

pub use http::{ApiConfig, HttpApi};
pub use routes::Route;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use rolo_core::{Contact, ContactDraft, ContactId, ContactPage, ContactPatch, ContactQuery, Transaction};

/// Error type for remote API calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The remote rejected the payload. The body is passed through verbatim.
    #[error("rejected by server ({status}): {body}")]
    Validation { status: u16, body: String },

    /// A success response whose body could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 | 422 => ApiError::Validation { status, body },
            _ => ApiError::Status { status, body },
        }
    }

    /// Whether the same request may succeed later.
    ///
    /// Transport failures and non-validation statuses are retryable. A
    /// validation rejection will be rejected again, and a decode failure
    /// means the remote already applied the call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Status { .. })
    }
}

/// Result type for remote API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Future returned by [`ContactsApi`] methods.
pub type ApiFuture<'a, T> = BoxFuture<'a, ApiResult<T>>;

/// Body returned by a successful delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    #[serde(default)]
    pub message: String,
}

/// Remote calls against the contacts service.
pub trait ContactsApi: Send + Sync {
    /// `POST /contacts`
    fn create_contact<'a>(&'a self, draft: &'a ContactDraft) -> ApiFuture<'a, Contact>;

    /// `PUT /contacts/{id}`
    fn update_contact<'a>(&'a self, id: ContactId, patch: &'a ContactPatch)
        -> ApiFuture<'a, Contact>;

    /// `DELETE /contacts/{id}`
    fn delete_contact(&self, id: ContactId) -> ApiFuture<'_, DeleteAck>;

    /// `POST /contacts/{id}/transaction?amount=..&note=..`
    fn add_transaction<'a>(
        &'a self,
        id: ContactId,
        amount: f64,
        note: &'a str,
    ) -> ApiFuture<'a, Contact>;

    /// `GET /contacts?search&sort&page&limit`
    fn list_contacts<'a>(&'a self, query: &'a ContactQuery) -> ApiFuture<'a, ContactPage>;

    /// `GET /contacts/{id}`
    fn get_contact(&self, id: ContactId) -> ApiFuture<'_, Contact>;

    /// `GET /contacts/{id}/transactions`
    fn list_transactions(&self, id: ContactId) -> ApiFuture<'_, Vec<Transaction>>;
}
