// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue commands: sync and pending.

use std::io::Write;

use crate::cli::OutputFormat;
use crate::display::format_operation;
use crate::error::Result;
use crate::facade::ContactsClient;
use crate::sync::QueueStore;

use super::write_json;

/// Replay queued changes and report what happened to them.
pub async fn sync(client: &ContactsClient, output: OutputFormat, out: &mut impl Write) -> Result<()> {
    let report = client.flush_or_join().await;
    if output == OutputFormat::Json {
        return write_json(out, &report);
    }

    if report.attempted() == 0 {
        writeln!(out, "Nothing to sync")?;
        return Ok(());
    }
    writeln!(out, "Sent {} queued change(s)", report.delivered)?;
    if report.requeued > 0 {
        writeln!(
            out,
            "{} change(s) could not be sent and stay queued",
            report.requeued
        )?;
    }
    if report.dead_lettered > 0 {
        writeln!(
            out,
            "{} change(s) were rejected and moved aside (see `rolo pending --dead`)",
            report.dead_lettered
        )?;
    }
    Ok(())
}

/// Print the operations stored in `store`, oldest first.
pub fn pending(store: &QueueStore, output: OutputFormat, out: &mut impl Write) -> Result<()> {
    let ops = store.load();
    if output == OutputFormat::Json {
        return write_json(out, &ops);
    }
    if ops.is_empty() {
        writeln!(out, "No queued changes")?;
    }
    for (index, op) in ops.iter().enumerate() {
        writeln!(out, "{}", format_operation(index, op))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
