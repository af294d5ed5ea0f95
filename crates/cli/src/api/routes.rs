// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request routing for the contacts service.

use reqwest::Method;

use rolo_core::{ContactId, ContactQuery, OperationPayload, QueuedOperation};

/// Method, path and query string of one remote call.
///
/// Paths are relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

impl Route {
    fn new(method: Method, path: String) -> Self {
        Route {
            method,
            path,
            query: Vec::new(),
        }
    }

    pub fn create_contact() -> Self {
        Route::new(Method::POST, "/contacts".to_string())
    }

    pub fn update_contact(id: ContactId) -> Self {
        Route::new(Method::PUT, format!("/contacts/{}", id))
    }

    pub fn delete_contact(id: ContactId) -> Self {
        Route::new(Method::DELETE, format!("/contacts/{}", id))
    }

    /// Amount and note travel in the query string, not the body.
    pub fn add_transaction(id: ContactId, amount: f64, note: &str) -> Self {
        let mut route = Route::new(Method::POST, format!("/contacts/{}/transaction", id));
        route.query = vec![("amount", amount.to_string()), ("note", note.to_string())];
        route
    }

    pub fn list_contacts(query: &ContactQuery) -> Self {
        let mut route = Route::new(Method::GET, "/contacts".to_string());
        route.query = query.to_params();
        route
    }

    pub fn get_contact(id: ContactId) -> Self {
        Route::new(Method::GET, format!("/contacts/{}", id))
    }

    pub fn list_transactions(id: ContactId) -> Self {
        Route::new(Method::GET, format!("/contacts/{}/transactions", id))
    }

    /// The single remote call a queued operation replays as.
    pub fn for_operation(op: &QueuedOperation) -> Self {
        match &op.payload {
            OperationPayload::Create(_) => Route::create_contact(),
            OperationPayload::Update { id, .. } => Route::update_contact(*id),
            OperationPayload::Delete { id } => Route::delete_contact(*id),
            OperationPayload::Transaction { id, amount, note } => {
                Route::add_transaction(*id, *amount, note)
            }
        }
    }

    /// `METHOD /path?query` for logs and diagnostics.
    pub fn describe(&self) -> String {
        if self.query.is_empty() {
            format!("{} {}", self.method, self.path)
        } else {
            let qs: Vec<String> = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!("{} {}?{}", self.method, self.path, qs.join("&"))
        }
    }
}
