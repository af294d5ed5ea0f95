// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime channel envelopes.
//!
//! Every frame on the push channel is a JSON object `{"type": ..., "data": ...}`.
//! Clients publish an envelope after each successful mutation; the relay
//! forwards it to every connected client.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactId};
use crate::error::{Error, Result};

/// Envelope type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    NewContact,
    UpdateContact,
    DeleteContact,
    NewTransaction,
}

impl EventType {
    /// Returns the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::NewContact => "new_contact",
            EventType::UpdateContact => "update_contact",
            EventType::DeleteContact => "delete_contact",
            EventType::NewTransaction => "new_transaction",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "new_contact" => Ok(EventType::NewContact),
            "update_contact" => Ok(EventType::UpdateContact),
            "delete_contact" => Ok(EventType::DeleteContact),
            "new_transaction" => Ok(EventType::NewTransaction),
            _ => Err(Error::InvalidEventType(s.to_string())),
        }
    }
}

/// Payload of a `delete_contact` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedContact {
    pub id: ContactId,
}

/// Payload of a `new_transaction` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub id: ContactId,
    pub amount: f64,
    pub note: String,
}

/// A message on the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Envelope {
    /// A contact was created; carries the canonical resource.
    NewContact(Contact),

    /// A contact was updated; carries the canonical resource.
    UpdateContact(Contact),

    /// A contact was deleted.
    DeleteContact(DeletedContact),

    /// A transaction was applied to a contact.
    NewTransaction(TransactionEvent),
}

impl Envelope {
    /// Creates a NewContact envelope.
    pub fn new_contact(contact: Contact) -> Self {
        Envelope::NewContact(contact)
    }

    /// Creates an UpdateContact envelope.
    pub fn update_contact(contact: Contact) -> Self {
        Envelope::UpdateContact(contact)
    }

    /// Creates a DeleteContact envelope.
    pub fn delete_contact(id: ContactId) -> Self {
        Envelope::DeleteContact(DeletedContact { id })
    }

    /// Creates a NewTransaction envelope.
    pub fn new_transaction(id: ContactId, amount: f64, note: impl Into<String>) -> Self {
        Envelope::NewTransaction(TransactionEvent {
            id,
            amount,
            note: note.into(),
        })
    }

    /// Returns the type tag.
    pub fn event_type(&self) -> EventType {
        match self {
            Envelope::NewContact(_) => EventType::NewContact,
            Envelope::UpdateContact(_) => EventType::UpdateContact,
            Envelope::DeleteContact(_) => EventType::DeleteContact,
            Envelope::NewTransaction(_) => EventType::NewTransaction,
        }
    }

    /// Returns the contact the event concerns.
    pub fn contact_id(&self) -> ContactId {
        match self {
            Envelope::NewContact(c) | Envelope::UpdateContact(c) => c.id,
            Envelope::DeleteContact(d) => d.id,
            Envelope::NewTransaction(t) => t.id,
        }
    }

    /// Serializes the envelope to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes an envelope from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
