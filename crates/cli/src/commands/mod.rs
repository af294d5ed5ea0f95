// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod contacts;
pub mod queue;
pub mod token;
pub mod watch;

use std::io::Write;

use serde::Serialize;

use crate::error::Result;

/// Write one value as a single JSON line.
pub(crate) fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    writeln!(out, "{json}")?;
    Ok(())
}
