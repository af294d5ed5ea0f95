// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rolo_core::ContactId;

pub use args::{ContactFields, ListArgs, OptionalFields};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse a finite amount. Accepts `12`, `-4.5`, `+3`.
fn amount(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("'{}' is not a finite number", s)),
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "rolo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Contact client that keeps working offline")]
#[command(
    long_about = "Contact client that keeps working offline.\n\n\
    Changes made while the server is unreachable are queued and sent once it is back. \
    Successful changes are announced to other clients over the realtime channel."
)]
pub struct Cli {
    /// Path to rolo.toml (default: <config dir>/rolo/rolo.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Directory for the queue, cache and session token
    #[arg(long, global = true, value_name = "dir")]
    pub state_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Contacts
    // ─────────────────────────────────────────────────────────────────────────
    /// Create a contact
    #[command(after_help = "\
Examples:
  rolo add \"Ana Pop\" 0712345678 ana@example.com
  rolo add \"Ion Rus\" 0722000111 ion@example.com --tag work")]
    Add {
        #[command(flatten)]
        fields: ContactFields,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Change fields of a contact
    #[command(after_help = "\
Examples:
  rolo edit 3 --phone 0799000111
  rolo edit 3 --tag family --notes \"met at the fair\"")]
    Edit {
        id: ContactId,

        #[command(flatten)]
        fields: OptionalFields,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Delete a contact
    Rm { id: ContactId },

    /// Record a balance movement
    #[command(after_help = "\
Examples:
  rolo txn 3 40
  rolo txn 3 -12.5 --note Lunch")]
    Txn {
        id: ContactId,

        /// Amount, negative for money owed
        #[arg(allow_negative_numbers = true, value_parser = amount)]
        amount: f64,

        /// Note for the transaction (default: Transfer)
        #[arg(long, short, value_parser = non_empty_string)]
        note: Option<String>,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// List contacts
    List {
        #[command(flatten)]
        args: ListArgs,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show a contact with its details
    Show {
        id: ContactId,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show the transaction history of a contact
    History {
        id: ContactId,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────────
    /// Send queued changes now
    Sync {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show queued changes
    Pending {
        /// Show operations that will not be retried instead
        #[arg(long)]
        dead: bool,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Print realtime events until interrupted
    Watch {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Store or clear the session bearer token
    Token {
        /// Token to store
        #[arg(value_parser = non_empty_string, required_unless_present = "clear")]
        token: Option<String>,

        /// Remove the stored token
        #[arg(long, conflicts_with = "token")]
        clear: bool,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
