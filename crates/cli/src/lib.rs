// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rolo - A contact client that keeps working offline.
//!
//! This crate provides the sync machinery behind the `rolo` CLI: a durable
//! queue of operations that could not reach the server, a coordinator that
//! replays them, and a realtime channel that tells other clients about
//! successful changes.
//!
//! # Main Components
//!
//! - [`ContactsClient`] - contact operations with offline fallback
//! - [`SyncCoordinator`](sync::SyncCoordinator) - owns the queue, replays it
//! - [`ChannelManager`](channel::ChannelManager) - realtime connection with reconnect
//! - [`SyncRuntime`] - wires the above together and owns the background tasks
//! - [`Config`] - `rolo.toml` settings
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use rolo::{Config, SyncRuntime};
//!
//! let runtime = SyncRuntime::start(&Config::load_default()?)?;
//! match runtime.client().create_contact(draft).await {
//!     Ok(contact) => println!("created #{}", contact.id),
//!     Err(e) if e.is_queued() => println!("offline, will retry: {}", e),
//!     Err(e) => return Err(e),
//! }
//! runtime.shutdown().await;
//! ```

mod cli;
mod commands;
mod display;

pub mod api;
pub mod backoff;
pub mod channel;
pub mod config;
pub mod error;
pub mod facade;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod test_helpers;

pub use cli::{Cli, Command, ContactFields, ListArgs, OptionalFields, OutputFormat};
pub use config::Config;
pub use error::{Error, Result};
pub use facade::{ContactsClient, Listing};
pub use runtime::SyncRuntime;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::session::SessionToken;
use crate::storage::{FileSlots, SlotStorage};
use crate::sync::{QueueStore, DEAD_LETTER_SLOT};

/// Resolve configuration from the command-line overrides.
pub fn load_config(path: Option<PathBuf>, state_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(&path)?,
        None => Config::load_default()?,
    };
    if let Some(dir) = state_dir {
        config.state_dir = Some(dir);
    }
    Ok(config)
}

fn open_slots(config: &Config) -> Result<Arc<dyn SlotStorage>> {
    Ok(Arc::new(FileSlots::open(&config.state_dir()?)?))
}

/// Run one command, writing its output to `out`.
pub async fn run(command: Command, config: &Config, out: &mut impl Write) -> Result<()> {
    // Commands that only touch local state never connect.
    match command {
        Command::Token { token, clear } => {
            let session = SessionToken::new(open_slots(config)?);
            return commands::token::run(&session, token.as_deref(), clear, out);
        }
        Command::Pending { dead, output } => {
            let slot = if dead {
                DEAD_LETTER_SLOT
            } else {
                config.queue_slot.as_str()
            };
            let store = QueueStore::new(open_slots(config)?, slot);
            return commands::queue::pending(&store, output, out);
        }
        _ => {}
    }

    let runtime = SyncRuntime::start(config)?;
    if !runtime.wait_connected(config.connect_timeout()).await {
        tracing::debug!("realtime channel not open, continuing without it");
    }
    let result = run_online(command, &runtime, out).await;
    runtime.shutdown().await;
    result
}

async fn run_online(command: Command, runtime: &SyncRuntime, out: &mut impl Write) -> Result<()> {
    let client = runtime.client();
    match command {
        Command::Add { fields, output } => {
            commands::contacts::add(client, fields.into(), output, out).await
        }
        Command::Edit { id, fields, output } => {
            commands::contacts::edit(client, id, fields.into(), output, out).await
        }
        Command::Rm { id } => commands::contacts::remove(client, id, out).await,
        Command::Txn {
            id,
            amount,
            note,
            output,
        } => commands::contacts::transaction(client, id, amount, note.as_deref(), output, out).await,
        Command::List { args, output } => {
            commands::contacts::list(client, &args.into(), output, out).await
        }
        Command::Show { id, output } => commands::contacts::show(client, id, output, out).await,
        Command::History { id, output } => {
            commands::contacts::history(client, id, output, out).await
        }
        Command::Sync { output } => commands::queue::sync(client, output, out).await,
        Command::Watch { output } => {
            commands::watch::run(runtime.channel(), output, out, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("failed to listen for Ctrl-C: {}", e);
                }
            })
            .await
        }
        Command::Token { .. } | Command::Pending { .. } => Ok(()),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
