// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Contact commands: add, edit, rm, txn, list, show, history.
//!
//! A change the server could not receive fails the command with a hint that
//! it was saved offline.

use std::io::Write;

use serde::Serialize;

use rolo_core::{Contact, ContactDraft, ContactId, ContactPage, ContactPatch, ContactQuery};

use crate::cli::OutputFormat;
use crate::display::{
    format_amount, format_contact_details, format_contact_line, format_page_footer,
    format_transaction,
};
use crate::error::Result;
use crate::facade::ContactsClient;

use super::write_json;

#[derive(Serialize)]
struct ListingJson<'a> {
    #[serde(flatten)]
    page: &'a ContactPage,
    stale: bool,
}

fn write_contact(out: &mut impl Write, contact: &Contact, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => write_json(out, contact),
        OutputFormat::Text => {
            writeln!(out, "{}", format_contact_line(contact))?;
            Ok(())
        }
    }
}

pub async fn add(
    client: &ContactsClient,
    draft: ContactDraft,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let created = client.create_contact(draft).await?;
    write_contact(out, &created, output)
}

pub async fn edit(
    client: &ContactsClient,
    id: ContactId,
    patch: ContactPatch,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let updated = client.update_contact(id, patch).await?;
    write_contact(out, &updated, output)
}

pub async fn remove(client: &ContactsClient, id: ContactId, out: &mut impl Write) -> Result<()> {
    client.delete_contact(id).await?;
    writeln!(out, "Deleted #{}", id)?;
    Ok(())
}

pub async fn transaction(
    client: &ContactsClient,
    id: ContactId,
    amount: f64,
    note: Option<&str>,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let updated = client.add_transaction(id, amount, note).await?;
    match output {
        OutputFormat::Json => write_json(out, &updated),
        OutputFormat::Text => {
            writeln!(
                out,
                "#{} {}: balance {}",
                updated.id,
                updated.name,
                format_amount(updated.last_transaction)
            )?;
            Ok(())
        }
    }
}

pub async fn list(
    client: &ContactsClient,
    query: &ContactQuery,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let listing = client.list_contacts(query).await?;
    match output {
        OutputFormat::Json => write_json(
            out,
            &ListingJson {
                page: &listing.page,
                stale: listing.stale,
            },
        ),
        OutputFormat::Text => {
            for contact in &listing.page.items {
                writeln!(out, "{}", format_contact_line(contact))?;
            }
            writeln!(out, "{}", format_page_footer(&listing.page, listing.stale))?;
            Ok(())
        }
    }
}

pub async fn show(
    client: &ContactsClient,
    id: ContactId,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let contact = client.get_contact(id).await?;
    match output {
        OutputFormat::Json => write_json(out, &contact),
        OutputFormat::Text => {
            writeln!(out, "{}", format_contact_details(&contact))?;
            Ok(())
        }
    }
}

pub async fn history(
    client: &ContactsClient,
    id: ContactId,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let transactions = client.list_transactions(id).await?;
    match output {
        OutputFormat::Json => write_json(out, &transactions),
        OutputFormat::Text => {
            if transactions.is_empty() {
                writeln!(out, "No transactions for #{}", id)?;
            }
            for txn in &transactions {
                writeln!(out, "{}", format_transaction(txn))?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "contacts_tests.rs"]
mod tests;
