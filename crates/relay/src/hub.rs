// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast hub shared by all connections.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Frames a slow peer may fall behind before it starts losing them.
pub const DEFAULT_CAPACITY: usize = 256;

/// A text frame tagged with the connection it came from.
#[derive(Clone, Debug)]
pub struct Frame {
    pub from: u64,
    pub text: String,
}

/// Fans frames out to every connected peer.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    tx: broadcast::Sender<Frame>,
    next_peer: AtomicU64,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Hub {
            inner: Arc::new(HubInner {
                tx,
                next_peer: AtomicU64::new(1),
            }),
        }
    }

    /// Register a peer. Returns its id and a receiver for everyone else's frames.
    pub fn join(&self) -> (u64, broadcast::Receiver<Frame>) {
        let id = self.inner.next_peer.fetch_add(1, Ordering::Relaxed);
        (id, self.inner.tx.subscribe())
    }

    /// Send `text` to every peer. Returns how many receivers got it,
    /// including the sender's own receiver.
    pub fn publish(&self, from: u64, text: String) -> usize {
        self.inner.tx.send(Frame { from, text }).unwrap_or(0)
    }

    pub fn peer_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Hub::new(DEFAULT_CAPACITY)
    }
}
