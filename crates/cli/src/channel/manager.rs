// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background management of the realtime connection.
//!
//! [`ChannelManager::start`] spawns one task that owns the transport. The
//! task connects, pumps frames in both directions while open, and after any
//! close waits out the reconnect delay before trying again. Callers only
//! ever see the shared state, the listener registry and the outbound queue.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use rolo_core::Envelope;

use super::transport::Transport;
use super::Notifier;
use crate::backoff::BackoffPolicy;

/// Connection lifecycle.
///
/// `Connecting → Open → Closed { retry_pending: true } → Connecting → …`.
/// Only [`ChannelManager::shutdown`] or an exhausted reconnect cap leaves
/// it at `Closed { retry_pending: false }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed { retry_pending: bool },
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Open => write!(f, "open"),
            ChannelState::Closed {
                retry_pending: true,
            } => write!(f, "closed (reconnect pending)"),
            ChannelState::Closed {
                retry_pending: false,
            } => write!(f, "closed"),
        }
    }
}

/// Configuration for the channel manager.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Endpoint URL.
    pub url: String,
    /// Delay schedule between a close and the next connect.
    pub reconnect: BackoffPolicy,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            url: "ws://localhost:8000/ws".to_string(),
            reconnect: BackoffPolicy::default(),
        }
    }
}

type Listener = Arc<dyn Fn(&Envelope) + Send + Sync>;

/// Registered listeners, invoked in registration order.
#[derive(Default)]
struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener>>,
}

impl ListenerRegistry {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, Listener>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn add(&self, listener: Listener) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, listener);
        id
    }

    fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn dispatch(&self, frame: &str) {
        let envelope = match Envelope::from_json(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("dropping malformed realtime frame: {}", e);
                return;
            }
        };
        tracing::debug!(
            "received {} for contact {}",
            envelope.event_type(),
            envelope.contact_id()
        );

        // Listeners may subscribe or unsubscribe from inside the callback.
        let snapshot: Vec<Listener> = self.lock().values().cloned().collect();
        for listener in snapshot {
            listener(&envelope);
        }
    }
}

/// Handle returned by [`ChannelManager::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    /// Stop delivery to this listener. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

/// State shared between the connection task and callers.
struct Shared {
    state: watch::Sender<ChannelState>,
    attempts: AtomicU32,
    listeners: Arc<ListenerRegistry>,
}

impl Shared {
    fn set_state(&self, state: ChannelState) {
        self.state.send_replace(state);
    }
}

/// Maintains the realtime connection and fans out inbound events.
pub struct ChannelManager {
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<String>,
    cancel_token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChannelManager {
    /// Start connecting in the background. Must be called inside a tokio
    /// runtime.
    pub fn start<T: Transport + 'static>(config: ChannelConfig, transport: T) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Connecting);
        let shared = Arc::new(Shared {
            state: state_tx,
            attempts: AtomicU32::new(0),
            listeners: Arc::new(ListenerRegistry::default()),
        });
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        let task = tokio::spawn(run_connection(
            transport,
            config,
            Arc::clone(&shared),
            outbound_rx,
            cancel_token.clone(),
        ));

        ChannelManager {
            shared,
            outbound,
            cancel_token,
            task: Mutex::new(Some(task)),
        }
    }

    /// Register a listener for every decoded inbound event.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        let id = self.shared.listeners.add(Arc::new(listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.shared.listeners),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Send an event if the connection is open; drop it otherwise.
    ///
    /// Returns whether the event was handed to the connection.
    pub fn publish(&self, envelope: &Envelope) -> bool {
        if self.state() != ChannelState::Open {
            tracing::debug!("channel not open, dropping {}", envelope.event_type());
            return false;
        }
        let frame = match envelope.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("failed to encode {}: {}", envelope.event_type(), e);
                return false;
            }
        };
        self.outbound.send(frame).is_ok()
    }

    /// Current connection state.
    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    /// Connection attempts made so far, successful or not.
    pub fn connect_attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::Acquire)
    }

    /// Cancel any pending reconnect, close the connection and wait for the
    /// background task to finish.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!("channel task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl Notifier for ChannelManager {
    fn publish(&self, envelope: &Envelope) -> bool {
        ChannelManager::publish(self, envelope)
    }
}

/// Why an open connection stopped serving.
enum Stop {
    Shutdown,
    Closed(String),
}

async fn run_connection<T: Transport>(
    mut transport: T,
    config: ChannelConfig,
    shared: Arc<Shared>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    cancel_token: CancellationToken,
) {
    // Consecutive closes since the last successful open.
    let mut failures = 0u32;

    loop {
        shared.set_state(ChannelState::Connecting);
        let attempt = shared.attempts.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!("connecting to {} (attempt {})", config.url, attempt);

        let connected = tokio::select! {
            _ = cancel_token.cancelled() => break,
            result = transport.connect(&config.url) => result,
        };

        match connected {
            Ok(()) => {
                failures = 0;
                tracing::info!("realtime channel open: {}", config.url);
                shared.set_state(ChannelState::Open);

                match serve(&mut transport, &shared, &mut outbound_rx, &cancel_token).await {
                    Stop::Shutdown => {
                        // Events handed over before shutdown still go out.
                        while let Ok(frame) = outbound_rx.try_recv() {
                            if let Err(e) = transport.send(frame).await {
                                tracing::debug!("dropping unsent events: {}", e);
                                break;
                            }
                        }
                        if let Err(e) = transport.disconnect().await {
                            tracing::debug!("disconnect failed: {}", e);
                        }
                        break;
                    }
                    Stop::Closed(reason) => {
                        tracing::info!("realtime channel closed: {}", reason);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("realtime connect attempt {} failed: {}", attempt, e);
            }
        }

        failures = failures.saturating_add(1);
        // The next connect would be attempt `failures + 1` of this run.
        if !config.reconnect.allows(failures.saturating_add(1)) {
            tracing::warn!("giving up on realtime channel after {} failures", failures);
            break;
        }
        shared.set_state(ChannelState::Closed {
            retry_pending: true,
        });

        // Events published while open but not yet sent belong to the old
        // connection.
        while outbound_rx.try_recv().is_ok() {}

        let delay = config.reconnect.delay_for(failures);
        tracing::debug!("reconnecting in {:?}", delay);
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    shared.set_state(ChannelState::Closed {
        retry_pending: false,
    });
}

async fn serve<T: Transport>(
    transport: &mut T,
    shared: &Shared,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    cancel_token: &CancellationToken,
) -> Stop {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => return Stop::Shutdown,
            frame = transport.recv() => match frame {
                Ok(Some(text)) => shared.listeners.dispatch(&text),
                Ok(None) => return Stop::Closed("closed by peer".to_string()),
                Err(e) => return Stop::Closed(e.to_string()),
            },
            Some(frame) = outbound_rx.recv() => {
                if let Err(e) = transport.send(frame).await {
                    return Stop::Closed(e.to_string());
                }
            }
        }
    }
}
