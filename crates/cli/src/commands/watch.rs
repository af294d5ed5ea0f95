// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::io::Write;

use tokio::sync::mpsc;

use crate::channel::ChannelManager;
use crate::cli::OutputFormat;
use crate::display::format_event;
use crate::error::Result;

use super::write_json;

/// Print inbound realtime events until `stop` completes.
///
/// Connection state changes are logged, not printed, so the output stays
/// one event per line.
pub async fn run(
    channel: &ChannelManager,
    output: OutputFormat,
    out: &mut impl Write,
    stop: impl Future<Output = ()>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = channel.subscribe(move |envelope| {
        let _ = tx.send(envelope.clone());
    });
    let mut state = channel.watch_state();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            Some(envelope) = rx.recv() => {
                match output {
                    OutputFormat::Json => write_json(out, &envelope)?,
                    OutputFormat::Text => writeln!(out, "{}", format_event(&envelope))?,
                }
                out.flush()?;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                tracing::info!("realtime channel {}", *state.borrow_and_update());
            }
        }
    }

    subscription.unsubscribe();
    Ok(())
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
