// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Contact records as exchanged with the remote service.
//!
//! The remote owns canonical state: every mutating call answers with the
//! created or updated [`Contact`]. Drafts and patches are the client-side
//! request bodies, and are also what gets persisted inside queued operations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Remote identifier of a contact.
pub type ContactId = i64;

/// Note attached to a transaction when the caller supplies none.
pub const DEFAULT_TRANSACTION_NOTE: &str = "Transfer";

/// A contact as returned by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub last_transaction: f64,
    #[serde(default)]
    pub transaction_history: Vec<Transaction>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Contact {
    /// Case-insensitive match on name, phone or tag.
    ///
    /// Mirrors the list filter applied to cached contacts when the remote
    /// search endpoint is unreachable. An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.phone.contains(&query)
            || self
                .tag
                .as_deref()
                .is_some_and(|tag| tag.to_lowercase().contains(&query))
    }
}

/// A single balance movement recorded against a contact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<i64>,
    pub amount: f64,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub contact_id: Option<ContactId>,
}

/// Request body for creating a contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactDraft {
    /// Client-known identifier, when the caller already has one.
    ///
    /// The remote assigns ids on create and ignores this field; it lets a
    /// queued create be correlated with later queued updates for the same
    /// contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ContactId>,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub last_transaction: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl ContactDraft {
    /// Creates a draft with the three required fields.
    pub fn new(name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        ContactDraft {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    /// Sets a client-known id.
    pub fn with_id(mut self, id: ContactId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the free-form notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Checks the fields the remote always rejects when missing.
    ///
    /// The remote applies stricter rules (phone pattern, email syntax) and
    /// reports them as validation errors; this only catches blanks.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("phone", &self.phone),
            ("email", &self.email),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("{} cannot be empty", field)));
            }
        }
        check_finite_balance(Some(self.last_transaction))
    }
}

/// Non-finite balances serialize as `null` and cannot be read back.
fn check_finite_balance(balance: Option<f64>) -> Result<()> {
    match balance {
        Some(v) if !v.is_finite() => Err(Error::InvalidInput(format!(
            "last_transaction must be a finite number, got {}",
            v
        ))),
        _ => Ok(()),
    }
}

/// Request body for updating a contact. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transaction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl ContactPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == ContactPatch::default()
    }

    /// Checks the fields that would not survive a round trip through JSON.
    pub fn validate(&self) -> Result<()> {
        check_finite_balance(self.last_transaction)
    }
}

/// Parameters of a contact listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactQuery {
    pub search: String,
    pub sort: String,
    pub page: u32,
    pub limit: u32,
}

impl Default for ContactQuery {
    fn default() -> Self {
        ContactQuery {
            search: String::new(),
            sort: String::new(),
            page: 1,
            limit: 20,
        }
    }
}

impl ContactQuery {
    /// Query-string pairs in the order the remote expects them.
    ///
    /// Empty search and sort values are omitted.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        if !self.search.is_empty() {
            params.push(("search", self.search.clone()));
        }
        if !self.sort.is_empty() {
            params.push(("sort", self.sort.clone()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("limit", self.limit.to_string()));
        params
    }

    /// Evaluate the query locally over a set of contacts.
    ///
    /// Follows the remote's rules: filter with [`Contact::matches`], sort by
    /// the named field (`-field` for descending; unknown fields keep id
    /// order), then cut the requested page.
    pub fn apply(&self, contacts: &[Contact]) -> ContactPage {
        let mut matching: Vec<Contact> = contacts
            .iter()
            .filter(|c| c.matches(&self.search))
            .cloned()
            .collect();
        matching.sort_by_key(|c| c.id);

        let (field, descending) = match self.sort.strip_prefix('-') {
            Some(field) => (field, true),
            None => (self.sort.as_str(), false),
        };
        let ordered = match field {
            "name" => {
                matching.sort_by(|a, b| a.name.cmp(&b.name));
                true
            }
            "phone" => {
                matching.sort_by(|a, b| a.phone.cmp(&b.phone));
                true
            }
            "email" => {
                matching.sort_by(|a, b| a.email.cmp(&b.email));
                true
            }
            "tag" => {
                matching.sort_by(|a, b| a.tag.cmp(&b.tag));
                true
            }
            "last_transaction" => {
                matching.sort_by(|a, b| a.last_transaction.total_cmp(&b.last_transaction));
                true
            }
            "id" => true,
            _ => false,
        };
        if ordered && descending {
            matching.reverse();
        }

        let limit = self.limit.max(1);
        let page = self.page.max(1);
        let total = matching.len();
        let skip = (page as usize - 1).saturating_mul(limit as usize);
        ContactPage {
            items: matching
                .into_iter()
                .skip(skip)
                .take(limit as usize)
                .collect(),
            total: total as u64,
            page,
            limit,
            pages: total.div_ceil(limit as usize) as u32,
        }
    }
}

/// One page of a contact listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactPage {
    pub items: Vec<Contact>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

#[cfg(test)]
#[path = "contact_tests.rs"]
mod tests;
