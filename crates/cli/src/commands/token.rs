// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::error::Result;
use crate::session::{SessionToken, TokenSource};

/// Store `token` in the session slot, or clear it.
pub fn run(
    session: &SessionToken,
    token: Option<&str>,
    clear: bool,
    out: &mut impl Write,
) -> Result<()> {
    if clear {
        session.clear()?;
        writeln!(out, "Session token cleared")?;
        return Ok(());
    }
    if let Some(token) = token {
        session.store(token)?;
    }
    match session.bearer_token() {
        Some(_) => writeln!(out, "Session token stored")?,
        None => writeln!(out, "No session token set")?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
