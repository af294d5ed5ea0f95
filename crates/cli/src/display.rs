// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rolo_core::{Contact, ContactPage, Envelope, QueuedOperation, Transaction};

/// Format an amount with an explicit sign and two decimals.
pub fn format_amount(amount: f64) -> String {
    format!("{:+.2}", amount)
}

/// Format a single contact line for list output
pub fn format_contact_line(contact: &Contact) -> String {
    let mut line = format!(
        "- #{} {} <{}> {}",
        contact.id, contact.name, contact.email, contact.phone
    );
    if let Some(tag) = &contact.tag {
        line.push_str(&format!(" [{}]", tag));
    }
    line
}

/// Format the footer of a listing.
pub fn format_page_footer(page: &ContactPage, stale: bool) -> String {
    let mut footer = format!(
        "page {}/{} ({} contacts)",
        page.page,
        page.pages.max(1),
        page.total
    );
    if stale {
        footer.push_str(", offline: showing cached contacts");
    }
    footer
}

/// Format contact details for the show command
pub fn format_contact_details(contact: &Contact) -> String {
    let mut output = Vec::new();

    output.push(format!("#{} {}", contact.id, contact.name));
    output.push(format!("Phone: {}", contact.phone));
    output.push(format!("Email: {}", contact.email));
    if let Some(tag) = &contact.tag {
        output.push(format!("Tag: {}", tag));
    }
    output.push(format!(
        "Balance: {}",
        format_amount(contact.last_transaction)
    ));
    if let Some(created) = contact.created_at {
        output.push(format!("Created: {}", created.format("%Y-%m-%d %H:%M")));
    }
    if let Some(updated) = contact.updated_at {
        output.push(format!("Updated: {}", updated.format("%Y-%m-%d %H:%M")));
    }

    if let Some(notes) = contact.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        output.push(String::new());
        output.push("Notes:".to_string());
        for line in notes.lines() {
            output.push(format!("    {}", line));
        }
    }

    if !contact.transaction_history.is_empty() {
        output.push(String::new());
        output.push("Transactions:".to_string());
        for txn in &contact.transaction_history {
            output.push(format!("  {}", format_transaction(txn)));
        }
    }

    output.join("\n")
}

/// Format one transaction history entry
pub fn format_transaction(txn: &Transaction) -> String {
    let date = txn
        .date
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    match &txn.note {
        Some(note) => format!("{}  {}  {}", date, format_amount(txn.amount), note),
        None => format!("{}  {}", date, format_amount(txn.amount)),
    }
}

/// Format a queued operation for the pending command
pub fn format_operation(index: usize, op: &QueuedOperation) -> String {
    if op.attempts == 0 {
        format!("{:>3}. {}", index + 1, op)
    } else {
        format!("{:>3}. {} (failed {}x)", index + 1, op, op.attempts)
    }
}

/// Format a realtime event for the watch command
pub fn format_event(envelope: &Envelope) -> String {
    match envelope {
        Envelope::NewContact(c) => format!("new_contact     #{} {}", c.id, c.name),
        Envelope::UpdateContact(c) => format!("update_contact  #{} {}", c.id, c.name),
        Envelope::DeleteContact(d) => format!("delete_contact  #{}", d.id),
        Envelope::NewTransaction(t) => format!(
            "new_transaction #{} {} {}",
            t.id,
            format_amount(t.amount),
            t.note
        ),
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
