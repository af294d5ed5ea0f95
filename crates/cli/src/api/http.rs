// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP implementation of [`ContactsApi`] using reqwest.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use rolo_core::{Contact, ContactDraft, ContactId, ContactPage, ContactPatch, ContactQuery, Transaction};

use super::routes::Route;
use super::{ApiError, ApiFuture, ApiResult, ContactsApi, DeleteAck};
use crate::session::TokenSource;

/// Connection settings for the remote service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "http://localhost:8000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Contacts API over HTTP.
///
/// The bearer token is looked up from the [`TokenSource`] on every request.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl HttpApi {
    /// Build a client for the given service.
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenSource>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("rolo/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(HttpApi {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Absolute URL for a route.
    pub fn url(&self, route: &Route) -> String {
        format!("{}{}", self.base_url, route.path)
    }

    async fn send<B, T>(&self, route: Route, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("-> {}", route.describe());

        let mut request = self.client.request(route.method.clone(), self.url(&route));
        if !route.query.is_empty() {
            request = request.query(&route.query);
        }
        if let Some(token) = self.tokens.bearer_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!("<- {} {}", status.as_u16(), route.describe());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl ContactsApi for HttpApi {
    fn create_contact<'a>(&'a self, draft: &'a ContactDraft) -> ApiFuture<'a, Contact> {
        Box::pin(self.send(Route::create_contact(), Some(draft)))
    }

    fn update_contact<'a>(
        &'a self,
        id: ContactId,
        patch: &'a ContactPatch,
    ) -> ApiFuture<'a, Contact> {
        Box::pin(self.send(Route::update_contact(id), Some(patch)))
    }

    fn delete_contact(&self, id: ContactId) -> ApiFuture<'_, DeleteAck> {
        Box::pin(self.send::<(), _>(Route::delete_contact(id), None))
    }

    fn add_transaction<'a>(
        &'a self,
        id: ContactId,
        amount: f64,
        note: &'a str,
    ) -> ApiFuture<'a, Contact> {
        Box::pin(self.send::<(), _>(Route::add_transaction(id, amount, note), None))
    }

    fn list_contacts<'a>(&'a self, query: &'a ContactQuery) -> ApiFuture<'a, ContactPage> {
        Box::pin(self.send::<(), _>(Route::list_contacts(query), None))
    }

    fn get_contact(&self, id: ContactId) -> ApiFuture<'_, Contact> {
        Box::pin(self.send::<(), _>(Route::get_contact(id), None))
    }

    fn list_transactions(&self, id: ContactId) -> ApiFuture<'_, Vec<Transaction>> {
        Box::pin(self.send::<(), _>(Route::list_transactions(id), None))
    }
}
