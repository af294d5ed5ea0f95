// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime wiring: storage, remote API, queue, realtime channel and facade.
//!
//! The runtime owns the background tasks:
//! 1. Channel connection with reconnect timer (inside [`ChannelManager`])
//! 2. Flush whenever the channel (re)opens and work is queued
//! 3. Optional periodic flush driven by the `[retry]` schedule
//!
//! Inbound realtime events are folded into the contact cache.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{ContactsApi, HttpApi};
use crate::backoff::BackoffPolicy;
use crate::channel::{ChannelManager, ChannelState, Subscription, Transport, WebSocketTransport};
use crate::config::Config;
use crate::error::Result;
use crate::facade::ContactsClient;
use crate::session::SessionToken;
use crate::storage::{FileSlots, SlotStorage};
use crate::sync::{ApiExecutor, QueueStore, SyncCoordinator, DEAD_LETTER_SLOT};

/// A running client: facade plus the tasks that keep it in sync.
pub struct SyncRuntime {
    client: Arc<ContactsClient>,
    channel: Arc<ChannelManager>,
    subscription: Subscription,
    cancel_token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncRuntime {
    /// Open the state directory, connect to the configured service and
    /// start the background tasks. Must be called inside a tokio runtime.
    pub fn start(config: &Config) -> Result<Self> {
        let state_dir = config.state_dir()?;
        let storage: Arc<dyn SlotStorage> = Arc::new(FileSlots::open(&state_dir)?);
        let tokens = Arc::new(SessionToken::new(Arc::clone(&storage)));
        let api: Arc<dyn ContactsApi> = Arc::new(HttpApi::new(&config.api_config(), tokens)?);
        tracing::debug!(
            "runtime starting: api={} ws={} state={}",
            config.api_url,
            config.ws_url,
            state_dir.display()
        );
        Ok(Self::with_parts(config, api, storage, WebSocketTransport::new()))
    }

    /// Start with injected parts.
    pub fn with_parts<T: Transport + 'static>(
        config: &Config,
        api: Arc<dyn ContactsApi>,
        storage: Arc<dyn SlotStorage>,
        transport: T,
    ) -> Self {
        let coordinator = Arc::new(
            SyncCoordinator::new(
                ApiExecutor::new(Arc::clone(&api)),
                QueueStore::new(Arc::clone(&storage), &config.queue_slot),
                QueueStore::new(Arc::clone(&storage), DEAD_LETTER_SLOT),
            )
            .with_max_attempts(config.retry.max_attempts),
        );

        let channel = Arc::new(ChannelManager::start(config.channel_config(), transport));
        let client = Arc::new(ContactsClient::new(
            api,
            coordinator,
            channel.clone(),
            storage,
        ));

        // The channel holds the listener, so it must not keep the client alive.
        let weak: Weak<ContactsClient> = Arc::downgrade(&client);
        let subscription = channel.subscribe(move |envelope| {
            if let Some(client) = weak.upgrade() {
                client.apply_event(envelope);
            }
        });

        let cancel_token = CancellationToken::new();
        let mut tasks = vec![tokio::spawn(flush_on_reconnect(
            Arc::clone(&client),
            Arc::clone(&channel),
            cancel_token.clone(),
        ))];
        if config.background_flush {
            tasks.push(tokio::spawn(flush_periodically(
                Arc::clone(&client),
                config.retry.clone(),
                cancel_token.clone(),
            )));
        }

        SyncRuntime {
            client,
            channel,
            subscription,
            cancel_token,
            tasks: Mutex::new(tasks),
        }
    }

    pub fn client(&self) -> &Arc<ContactsClient> {
        &self.client
    }

    pub fn channel(&self) -> &Arc<ChannelManager> {
        &self.channel
    }

    /// Wait until the realtime channel is open, for at most `timeout`.
    ///
    /// Returns whether it opened. Commands that publish call this first so
    /// their events have a connection to go out on.
    pub async fn wait_connected(&self, timeout: Duration) -> bool {
        let mut state = self.channel.watch_state();
        let opened = tokio::time::timeout(timeout, state.wait_for(|s| *s == ChannelState::Open));
        let open = matches!(opened.await, Ok(Ok(_)));
        open
    }

    /// Stop the background tasks and close the channel.
    ///
    /// Flushes already in progress, including ones the client started in
    /// the background, run to completion first.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        self.subscription.unsubscribe();
        let tasks: Vec<_> = self
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("runtime task ended abnormally: {}", e);
            }
        }
        self.client.join_background().await;
        self.channel.shutdown().await;
        tracing::debug!("runtime stopped");
    }
}

impl Drop for SyncRuntime {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Flush the queue every time a new connection opens.
///
/// Opens are told apart by the attempt counter, so a close and reopen that
/// coalesce into a single `Open` observation still count.
async fn flush_on_reconnect(
    client: Arc<ContactsClient>,
    channel: Arc<ChannelManager>,
    cancel_token: CancellationToken,
) {
    let mut state = channel.watch_state();
    let mut served_attempt = 0u32;
    loop {
        if *state.borrow_and_update() == ChannelState::Open {
            let attempt = channel.connect_attempts();
            if attempt != served_attempt {
                served_attempt = attempt;
                let pending = client.pending().len();
                if pending > 0 {
                    tracing::info!("channel open, flushing {} queued operations", pending);
                    client.flush().await;
                }
            }
        }
        let changed = tokio::select! {
            _ = cancel_token.cancelled() => break,
            changed = state.changed() => changed,
        };
        if changed.is_err() {
            break;
        }
    }
}

/// Flush queued work on the retry schedule. The delay grows while flushes
/// keep requeueing and resets once one drains cleanly.
async fn flush_periodically(
    client: Arc<ContactsClient>,
    policy: BackoffPolicy,
    cancel_token: CancellationToken,
) {
    let mut failures: u32 = 0;
    loop {
        let delay = policy.delay_for(failures.saturating_add(1));
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
        if client.pending().is_empty() {
            failures = 0;
            continue;
        }
        let report = client.flush().await;
        if report.requeued > 0 {
            failures = failures.saturating_add(1);
            tracing::debug!(
                "background flush requeued {} ({} failed rounds)",
                report.requeued,
                failures
            );
        } else if !report.skipped {
            failures = 0;
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
