// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.
//!
//! These structs are used with `#[command(flatten)]` and convert into the
//! request bodies the client sends.

use clap::Args;
use rolo_core::{ContactDraft, ContactPatch, ContactQuery};

use super::non_empty_string;

/// Fields of a new contact.
#[derive(Args, Clone, Debug, Default)]
pub struct ContactFields {
    /// Full name
    #[arg(value_parser = non_empty_string)]
    pub name: String,

    /// Phone number
    #[arg(value_parser = non_empty_string)]
    pub phone: String,

    /// Email address
    #[arg(value_parser = non_empty_string)]
    pub email: String,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Tag used for grouping and search
    #[arg(long, short)]
    pub tag: Option<String>,
}

impl From<ContactFields> for ContactDraft {
    fn from(fields: ContactFields) -> Self {
        ContactDraft {
            notes: fields.notes,
            tag: fields.tag,
            ..ContactDraft::new(fields.name, fields.phone, fields.email)
        }
    }
}

/// Fields of a contact update. Only the given ones change.
#[derive(Args, Clone, Debug, Default)]
pub struct OptionalFields {
    #[arg(long, value_parser = non_empty_string)]
    pub name: Option<String>,

    #[arg(long, value_parser = non_empty_string)]
    pub phone: Option<String>,

    #[arg(long, value_parser = non_empty_string)]
    pub email: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long, short)]
    pub tag: Option<String>,
}

impl From<OptionalFields> for ContactPatch {
    fn from(fields: OptionalFields) -> Self {
        ContactPatch {
            name: fields.name,
            phone: fields.phone,
            email: fields.email,
            notes: fields.notes,
            tag: fields.tag,
            ..ContactPatch::default()
        }
    }
}

/// Search, sort and pagination arguments.
#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Match against name, phone or tag
    #[arg(long, short, default_value = "")]
    pub search: String,

    /// Sort field, prefix with '-' for descending (name, phone, email, tag, last_transaction)
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub sort: String,

    /// Page number, starting at 1
    #[arg(long, short, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Contacts per page
    #[arg(long = "limit", short = 'n', default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub limit: u32,
}

impl From<ListArgs> for ContactQuery {
    fn from(args: ListArgs) -> Self {
        ContactQuery {
            search: args.search,
            sort: args.sort,
            page: args.page,
            limit: args.limit,
        }
    }
}
