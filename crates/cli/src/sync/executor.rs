// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Replays a queued operation against the remote API.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use rolo_core::{OperationPayload, QueuedOperation};

use crate::api::{ApiError, ApiResult, ContactsApi};

/// Delivers one queued operation.
pub trait Executor: Send + Sync {
    /// Perform the single remote call the operation stands for.
    fn execute<'a>(&'a self, op: &'a QueuedOperation) -> BoxFuture<'a, ApiResult<()>>;
}

/// [`Executor`] backed by a [`ContactsApi`].
pub struct ApiExecutor<A: ContactsApi + ?Sized> {
    api: Arc<A>,
}

impl<A: ContactsApi + ?Sized> ApiExecutor<A> {
    pub fn new(api: Arc<A>) -> Self {
        ApiExecutor { api }
    }

    async fn run(&self, op: &QueuedOperation) -> ApiResult<()> {
        let result = match &op.payload {
            OperationPayload::Create(draft) => self.api.create_contact(draft).await.map(drop),
            OperationPayload::Update { id, patch } => {
                self.api.update_contact(*id, patch).await.map(drop)
            }
            OperationPayload::Delete { id } => match self.api.delete_contact(*id).await {
                // Already gone: the replay reached its end state.
                Err(ApiError::Status { status: 404, .. }) => {
                    tracing::debug!("{}: contact already deleted", op);
                    Ok(())
                }
                other => other.map(drop),
            },
            OperationPayload::Transaction { id, amount, note } => {
                self.api.add_transaction(*id, *amount, note).await.map(drop)
            }
        };

        match result {
            Err(ApiError::Decode(reason)) => {
                tracing::warn!("{}: delivered but response was unreadable: {}", op, reason);
                Ok(())
            }
            other => other,
        }
    }
}

impl<A: ContactsApi + ?Sized> Executor for ApiExecutor<A> {
    fn execute<'a>(&'a self, op: &'a QueuedOperation) -> BoxFuture<'a, ApiResult<()>> {
        Box::pin(self.run(op))
    }
}
