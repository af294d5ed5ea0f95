// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: fixtures and an in-memory contacts service.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Mutex;

use rolo_core::{
    Contact, ContactDraft, ContactId, ContactPage, ContactPatch, ContactQuery, QueuedOperation,
    Transaction,
};

use crate::api::{ApiError, ApiFuture, ApiResult, ContactsApi, DeleteAck, Route};

/// A valid draft with the given name.
pub fn draft(name: &str) -> ContactDraft {
    let slug = name.to_lowercase().replace(' ', ".");
    ContactDraft::new(name, "0712345678", format!("{}@example.com", slug))
}

/// `n` distinct deletes, ids `1..=n`.
pub fn make_ops(n: i64) -> Vec<QueuedOperation> {
    (1..=n).map(QueuedOperation::delete).collect()
}

/// A stored contact with the given id and name.
pub fn contact(id: ContactId, name: &str) -> Contact {
    let d = draft(name);
    Contact {
        id,
        name: d.name,
        phone: d.phone,
        email: d.email,
        notes: None,
        tag: None,
        last_transaction: 0.0,
        transaction_history: Vec::new(),
        video_url: None,
        created_at: None,
        updated_at: None,
    }
}

#[derive(Default)]
struct FakeState {
    contacts: BTreeMap<ContactId, Contact>,
    next_id: ContactId,
    calls: Vec<String>,
    offline: bool,
    failures: VecDeque<ApiError>,
    failing_ids: HashSet<ContactId>,
}

/// In-memory contacts service.
///
/// Every attempted call is recorded as `"METHOD /path?query"`, including the
/// ones that fail.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = FakeApi::default();
        api.state.lock().unwrap().next_id = 1;
        api
    }

    /// Every call fails with a network error while offline.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// The next call fails with `err`.
    pub fn fail_next(&self, err: ApiError) {
        self.state.lock().unwrap().failures.push_back(err);
    }

    /// Calls targeting `id` fail with a 503 until cleared.
    pub fn fail_contact(&self, id: ContactId) {
        self.state.lock().unwrap().failing_ids.insert(id);
    }

    pub fn heal_contact(&self, id: ContactId) {
        self.state.lock().unwrap().failing_ids.remove(&id);
    }

    pub fn seed(&self, contact: Contact) {
        let mut state = self.state.lock().unwrap();
        state.next_id = state.next_id.max(contact.id + 1);
        state.contacts.insert(contact.id, contact);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn contact(&self, id: ContactId) -> Option<Contact> {
        self.state.lock().unwrap().contacts.get(&id).cloned()
    }

    pub fn contact_count(&self) -> usize {
        self.state.lock().unwrap().contacts.len()
    }

    fn gate(&self, route: Route, target: Option<ContactId>) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(route.describe());
        if state.offline {
            return Err(ApiError::Network("connection refused".into()));
        }
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }
        if target.is_some_and(|id| state.failing_ids.contains(&id)) {
            return Err(ApiError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }

    fn not_found() -> ApiError {
        ApiError::Status {
            status: 404,
            body: r#"{"detail":"Contact not found"}"#.into(),
        }
    }

    fn do_create(&self, draft: &ContactDraft) -> ApiResult<Contact> {
        self.gate(Route::create_contact(), draft.id)?;
        if let Err(e) = draft.validate() {
            return Err(ApiError::Validation {
                status: 422,
                body: e.to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        let id = match draft.id {
            Some(id) => id,
            None => state.next_id,
        };
        state.next_id = state.next_id.max(id + 1);
        let mut created = contact(id, &draft.name);
        created.phone = draft.phone.clone();
        created.email = draft.email.clone();
        created.notes = draft.notes.clone();
        created.tag = draft.tag.clone();
        state.contacts.insert(id, created.clone());
        Ok(created)
    }

    fn do_update(&self, id: ContactId, patch: &ContactPatch) -> ApiResult<Contact> {
        self.gate(Route::update_contact(id), Some(id))?;
        let mut state = self.state.lock().unwrap();
        let stored = state.contacts.get_mut(&id).ok_or_else(Self::not_found)?;
        if let Some(name) = &patch.name {
            stored.name = name.clone();
        }
        if let Some(phone) = &patch.phone {
            stored.phone = phone.clone();
        }
        if let Some(email) = &patch.email {
            stored.email = email.clone();
        }
        if patch.notes.is_some() {
            stored.notes = patch.notes.clone();
        }
        if patch.tag.is_some() {
            stored.tag = patch.tag.clone();
        }
        if let Some(amount) = patch.last_transaction {
            stored.last_transaction = amount;
        }
        Ok(stored.clone())
    }

    fn do_delete(&self, id: ContactId) -> ApiResult<DeleteAck> {
        self.gate(Route::delete_contact(id), Some(id))?;
        let mut state = self.state.lock().unwrap();
        state.contacts.remove(&id).ok_or_else(Self::not_found)?;
        Ok(DeleteAck {
            message: "Contact deleted".into(),
        })
    }

    fn do_transaction(&self, id: ContactId, amount: f64, note: &str) -> ApiResult<Contact> {
        self.gate(Route::add_transaction(id, amount, note), Some(id))?;
        let mut state = self.state.lock().unwrap();
        let stored = state.contacts.get_mut(&id).ok_or_else(Self::not_found)?;
        stored.last_transaction += amount;
        stored.transaction_history.push(Transaction {
            id: Some(stored.transaction_history.len() as i64 + 1),
            amount,
            date: None,
            note: Some(note.to_string()),
            contact_id: Some(id),
        });
        Ok(stored.clone())
    }

    fn do_list(&self, query: &ContactQuery) -> ApiResult<ContactPage> {
        self.gate(Route::list_contacts(query), None)?;
        let state = self.state.lock().unwrap();
        let contacts: Vec<Contact> = state.contacts.values().cloned().collect();
        Ok(query.apply(&contacts))
    }

    fn do_get(&self, id: ContactId) -> ApiResult<Contact> {
        self.gate(Route::get_contact(id), Some(id))?;
        let state = self.state.lock().unwrap();
        state.contacts.get(&id).cloned().ok_or_else(Self::not_found)
    }

    fn do_history(&self, id: ContactId) -> ApiResult<Vec<Transaction>> {
        self.gate(Route::list_transactions(id), Some(id))?;
        let state = self.state.lock().unwrap();
        state
            .contacts
            .get(&id)
            .map(|c| c.transaction_history.clone())
            .ok_or_else(Self::not_found)
    }
}

impl ContactsApi for FakeApi {
    fn create_contact<'a>(&'a self, draft: &'a ContactDraft) -> ApiFuture<'a, Contact> {
        Box::pin(std::future::ready(self.do_create(draft)))
    }

    fn update_contact<'a>(
        &'a self,
        id: ContactId,
        patch: &'a ContactPatch,
    ) -> ApiFuture<'a, Contact> {
        Box::pin(std::future::ready(self.do_update(id, patch)))
    }

    fn delete_contact(&self, id: ContactId) -> ApiFuture<'_, DeleteAck> {
        Box::pin(std::future::ready(self.do_delete(id)))
    }

    fn add_transaction<'a>(
        &'a self,
        id: ContactId,
        amount: f64,
        note: &'a str,
    ) -> ApiFuture<'a, Contact> {
        Box::pin(std::future::ready(self.do_transaction(id, amount, note)))
    }

    fn list_contacts<'a>(&'a self, query: &'a ContactQuery) -> ApiFuture<'a, ContactPage> {
        Box::pin(std::future::ready(self.do_list(query)))
    }

    fn get_contact(&self, id: ContactId) -> ApiFuture<'_, Contact> {
        Box::pin(std::future::ready(self.do_get(id)))
    }

    fn list_transactions(&self, id: ContactId) -> ApiFuture<'_, Vec<Transaction>> {
        Box::pin(std::future::ready(self.do_history(id)))
    }
}

/// Notifier that records what it was asked to publish.
pub struct RecordingNotifier {
    open: std::sync::atomic::AtomicBool,
    published: Mutex<Vec<rolo_core::Envelope>>,
}

impl RecordingNotifier {
    pub fn new(open: bool) -> Self {
        RecordingNotifier {
            open: std::sync::atomic::AtomicBool::new(open),
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<rolo_core::Envelope> {
        self.published.lock().unwrap().clone()
    }
}

impl crate::channel::Notifier for RecordingNotifier {
    fn publish(&self, envelope: &rolo_core::Envelope) -> bool {
        if !self.open.load(std::sync::atomic::Ordering::SeqCst) {
            return false;
        }
        self.published.lock().unwrap().push(envelope.clone());
        true
    }
}

/// Yield to other tasks until `cond` holds.
pub async fn settle(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    assert!(cond(), "condition not reached");
}

/// A client over `api` whose notifier records instead of sending.
pub fn contacts_client(
    api: &std::sync::Arc<FakeApi>,
    storage: std::sync::Arc<dyn crate::storage::SlotStorage>,
) -> crate::facade::ContactsClient {
    use crate::sync::{ApiExecutor, QueueStore, SyncCoordinator, DEAD_LETTER_SLOT, PENDING_SLOT};
    use std::sync::Arc;

    let remote: Arc<dyn ContactsApi> = api.clone();
    let coordinator = Arc::new(SyncCoordinator::new(
        ApiExecutor::new(Arc::clone(&remote)),
        QueueStore::new(Arc::clone(&storage), PENDING_SLOT),
        QueueStore::new(Arc::clone(&storage), DEAD_LETTER_SLOT),
    ));
    crate::facade::ContactsClient::new(
        remote,
        coordinator,
        Arc::new(RecordingNotifier::new(true)),
        storage,
    )
}
