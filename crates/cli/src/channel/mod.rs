// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime channel.
//!
//! A single push connection that tells other clients about mutations this
//! client performed, and tells this client about theirs. It is a
//! best-effort notification path: nothing published while the connection
//! is down is retried. Durability belongs to the offline queue.

mod manager;
mod transport;

pub use manager::{ChannelConfig, ChannelManager, ChannelState, Subscription};
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};

use rolo_core::Envelope;

/// Outbound side of the channel as seen by mutation callers.
pub trait Notifier: Send + Sync {
    /// Publish an event. Returns whether it was handed to an open connection.
    fn publish(&self, envelope: &Envelope) -> bool;
}
