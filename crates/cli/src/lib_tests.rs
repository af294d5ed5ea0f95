// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Tests for the public `run()` function.
//!
//! The server addresses point at a closed port, so every remote call fails
//! with a network error and the offline paths are exercised end to end.

use std::path::Path;

use tempfile::TempDir;

use super::*;

fn offline_config(state_dir: &Path) -> Config {
    Config {
        api_url: "http://127.0.0.1:1".to_string(),
        ws_url: "ws://127.0.0.1:1/ws".to_string(),
        state_dir: Some(state_dir.to_path_buf()),
        connect_timeout_ms: 50,
        request_timeout_ms: 500,
        ..Config::default()
    }
}

async fn run_to_string(command: Command, config: &Config) -> Result<String> {
    let mut out = Vec::new();
    run(command, config, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

fn add_command(name: &str) -> Command {
    Command::Add {
        fields: ContactFields {
            name: name.to_string(),
            phone: "0712345678".to_string(),
            email: "ana@example.com".to_string(),
            notes: None,
            tag: None,
        },
        output: OutputFormat::Text,
    }
}

#[test]
fn load_config_applies_state_dir_override() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rolo.toml");
    std::fs::write(&path, "state_dir = \"/from/file\"\n").unwrap();

    let config = load_config(Some(path.clone()), None).unwrap();
    assert_eq!(config.state_dir, Some(PathBuf::from("/from/file")));

    let config = load_config(Some(path), Some(temp.path().join("cli"))).unwrap();
    assert_eq!(config.state_dir, Some(temp.path().join("cli")));
}

#[tokio::test]
async fn token_command_stores_in_state_dir() {
    let temp = TempDir::new().unwrap();
    let config = offline_config(temp.path());

    let out = run_to_string(
        Command::Token {
            token: Some("abc".to_string()),
            clear: false,
        },
        &config,
    )
    .await
    .unwrap();

    assert_eq!(out, "Session token stored\n");
    assert!(temp.path().join("token.json").exists());
}

#[tokio::test]
async fn pending_on_fresh_state_dir_is_empty() {
    let temp = TempDir::new().unwrap();
    let config = offline_config(temp.path());

    let out = run_to_string(
        Command::Pending {
            dead: false,
            output: OutputFormat::Text,
        },
        &config,
    )
    .await
    .unwrap();

    assert_eq!(out, "No queued changes\n");
}

#[tokio::test]
async fn offline_add_is_queued_and_listed_as_pending() {
    let temp = TempDir::new().unwrap();
    let config = offline_config(temp.path());

    let err = run_to_string(add_command("Ana Pop"), &config)
        .await
        .unwrap_err();
    assert!(err.is_queued(), "unexpected error: {}", err);

    let out = run_to_string(
        Command::Pending {
            dead: false,
            output: OutputFormat::Text,
        },
        &config,
    )
    .await
    .unwrap();
    assert!(out.starts_with("  1. create"), "unexpected output: {}", out);
    assert!(out.contains("Ana Pop"));
}

#[tokio::test]
async fn offline_list_without_cache_fails() {
    let temp = TempDir::new().unwrap();
    let config = offline_config(temp.path());

    let err = run_to_string(
        Command::List {
            args: ListArgs {
                search: String::new(),
                sort: String::new(),
                page: 1,
                limit: 20,
            },
            output: OutputFormat::Text,
        },
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::NoCache { .. }), "unexpected error: {}", err);
}
