// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Contact operations with offline fallback.
//!
//! Every mutation is attempted against the remote first. On success the
//! matching event goes out on the realtime channel. On a network-class
//! failure the operation is queued for replay and the failure is still
//! returned, so the caller sees [`Error::Queued`]. Validation rejections are
//! returned as-is and never queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use rolo_core::{
    Contact, ContactDraft, ContactId, ContactPage, ContactPatch, ContactQuery, Envelope,
    QueuedOperation, Transaction, DEFAULT_TRANSACTION_NOTE,
};

use crate::api::{ApiResult, ContactsApi};
use crate::channel::Notifier;
use crate::error::{Error, Result};
use crate::storage::SlotStorage;
use crate::sync::{ApiExecutor, FlushReport, SyncCoordinator};

/// Slot holding the last contact list fetched from the remote.
pub const CACHE_SLOT: &str = "cachedContacts";

/// Coordinator type used by the client.
pub type Coordinator = SyncCoordinator<ApiExecutor<dyn ContactsApi>>;

/// A page of contacts and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub page: ContactPage,
    /// Served from the local cache because the remote was unreachable.
    pub stale: bool,
}

/// Client-facing contact operations.
pub struct ContactsClient {
    api: Arc<dyn ContactsApi>,
    coordinator: Arc<Coordinator>,
    notifier: Arc<dyn Notifier>,
    storage: Arc<dyn SlotStorage>,
    offline: AtomicBool,
    /// Flushes started in the background by [`Self::spawn_flush`].
    background: Mutex<Vec<JoinHandle<FlushReport>>>,
}

impl ContactsClient {
    pub fn new(
        api: Arc<dyn ContactsApi>,
        coordinator: Arc<Coordinator>,
        notifier: Arc<dyn Notifier>,
        storage: Arc<dyn SlotStorage>,
    ) -> Self {
        // Leftovers from a previous run flush on the first successful call.
        let offline = AtomicBool::new(!coordinator.is_empty());
        ContactsClient {
            api,
            coordinator,
            notifier,
            storage,
            offline,
            background: Mutex::new(Vec::new()),
        }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Create a contact.
    pub async fn create_contact(&self, draft: ContactDraft) -> Result<Contact> {
        draft.validate()?;
        let result = self.api.create_contact(&draft).await;
        self.settle(result, QueuedOperation::create(draft), |c| {
            Envelope::new_contact(c.clone())
        })
    }

    /// Update the given fields of a contact.
    pub async fn update_contact(&self, id: ContactId, patch: ContactPatch) -> Result<Contact> {
        if patch.is_empty() {
            return Err(Error::EmptyPatch);
        }
        patch.validate()?;
        let result = self.api.update_contact(id, &patch).await;
        self.settle(result, QueuedOperation::update(id, patch), |c| {
            Envelope::update_contact(c.clone())
        })
    }

    /// Delete a contact.
    pub async fn delete_contact(&self, id: ContactId) -> Result<()> {
        let result = self.api.delete_contact(id).await.map(drop);
        self.settle(result, QueuedOperation::delete(id), |_| {
            Envelope::delete_contact(id)
        })
    }

    /// Record a balance movement. `note` defaults to "Transfer".
    pub async fn add_transaction(
        &self,
        id: ContactId,
        amount: f64,
        note: Option<&str>,
    ) -> Result<Contact> {
        if !amount.is_finite() {
            return Err(Error::InvalidAmount(amount));
        }
        let note = note.unwrap_or(DEFAULT_TRANSACTION_NOTE);
        let result = self.api.add_transaction(id, amount, note).await;
        self.settle(result, QueuedOperation::transaction(id, amount, note), |_| {
            Envelope::new_transaction(id, amount, note)
        })
    }

    /// List contacts, falling back to the cached list when offline.
    ///
    /// The unfiltered first page refreshes the cache. The fallback applies
    /// the query to the cached contacts and marks the listing stale.
    pub async fn list_contacts(&self, query: &ContactQuery) -> Result<Listing> {
        match self.api.list_contacts(query).await {
            Ok(page) => {
                self.mark_online();
                if query.search.is_empty() && query.page == 1 {
                    self.store_cache(&page.items);
                }
                Ok(Listing { page, stale: false })
            }
            Err(e) if e.is_retryable() => {
                self.mark_offline();
                let cached = self.cached_contacts();
                if cached.is_empty() {
                    return Err(Error::NoCache { source: e });
                }
                tracing::warn!("serving cached contacts: {}", e);
                Ok(Listing {
                    page: query.apply(&cached),
                    stale: true,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch a single contact.
    pub async fn get_contact(&self, id: ContactId) -> Result<Contact> {
        let result = self.api.get_contact(id).await;
        self.observe(result)
    }

    /// Fetch the transaction history of a contact.
    pub async fn list_transactions(&self, id: ContactId) -> Result<Vec<Transaction>> {
        let result = self.api.list_transactions(id).await;
        self.observe(result)
    }

    /// Replay queued operations now.
    pub async fn flush(&self) -> FlushReport {
        self.coordinator.flush().await
    }

    /// Replay queued operations now, or report the flush already running.
    pub async fn flush_or_join(&self) -> FlushReport {
        self.coordinator.flush_or_join().await
    }

    /// Wait for every flush started by [`Self::spawn_flush`] to finish.
    pub async fn join_background(&self) {
        let handles: Vec<_> = self
            .background
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("background flush ended abnormally: {}", e);
            }
        }
    }

    /// Queued operations in replay order.
    pub fn pending(&self) -> Vec<QueuedOperation> {
        self.coordinator.pending()
    }

    /// Contacts in the local cache.
    pub fn cached_contacts(&self) -> Vec<Contact> {
        self.load_cache().unwrap_or_default()
    }

    /// Fold a realtime event into the local cache, if one exists.
    pub fn apply_event(&self, envelope: &Envelope) {
        let Some(mut cached) = self.load_cache() else {
            return;
        };
        let before = cached.clone();
        match envelope {
            Envelope::NewContact(contact) | Envelope::UpdateContact(contact) => {
                match cached.iter_mut().find(|c| c.id == contact.id) {
                    Some(existing) => *existing = contact.clone(),
                    None => cached.push(contact.clone()),
                }
            }
            Envelope::DeleteContact(deleted) => cached.retain(|c| c.id != deleted.id),
            Envelope::NewTransaction(txn) => {
                if let Some(existing) = cached.iter_mut().find(|c| c.id == txn.id) {
                    existing.last_transaction += txn.amount;
                }
            }
        }
        if cached != before {
            self.store_cache(&cached);
        }
    }

    /// Start a flush in the background. [`Self::join_background`] waits
    /// for it.
    pub fn spawn_flush(&self) {
        let coordinator = Arc::clone(&self.coordinator);
        let handle = tokio::spawn(async move { coordinator.flush().await });
        let mut background = self.background.lock().unwrap_or_else(|e| e.into_inner());
        background.retain(|h| !h.is_finished());
        background.push(handle);
    }

    fn settle<T>(
        &self,
        result: ApiResult<T>,
        op: QueuedOperation,
        event: impl FnOnce(&T) -> Envelope,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                let envelope = event(&value);
                if !self.notifier.publish(&envelope) {
                    tracing::debug!("{} not broadcast: channel not open", envelope.event_type());
                }
                self.mark_online();
                Ok(value)
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!("{} failed, queued for replay: {}", op, e);
                self.mark_offline();
                self.coordinator.enqueue(op)?;
                Err(Error::Queued { source: e })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn observe<T>(&self, result: ApiResult<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.mark_online();
                Ok(value)
            }
            Err(e) => {
                if e.is_retryable() {
                    self.mark_offline();
                }
                Err(e.into())
            }
        }
    }

    fn mark_offline(&self) {
        self.offline.store(true, Ordering::Release);
    }

    fn mark_online(&self) {
        if self.offline.swap(false, Ordering::AcqRel) {
            tracing::info!("remote reachable again, flushing queued operations");
            self.spawn_flush();
        }
    }

    fn load_cache(&self) -> Option<Vec<Contact>> {
        match self.storage.read(CACHE_SLOT) {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(contacts) => Some(contacts),
                Err(e) => {
                    tracing::warn!("ignoring corrupt contact cache: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("failed to read contact cache: {}", e);
                None
            }
        }
    }

    fn store_cache(&self, contacts: &[Contact]) {
        let blob = match serde_json::to_string(contacts) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!("failed to encode contact cache: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.write(CACHE_SLOT, &blob) {
            tracing::warn!("failed to update contact cache: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "facade_tests.rs"]
mod tests;
