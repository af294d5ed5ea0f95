// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is read from `rolo.toml` and includes:
//! - `api_url`, `ws_url`: where the contacts service and its push channel live
//! - `state_dir`: where the queue, cache and session token are kept
//! - `[reconnect]`: delay schedule for the realtime channel
//! - `[retry]`: delay schedule for background flushes and the per-operation
//!   attempt cap
//!
//! A missing file means every default applies.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ApiConfig;
use crate::backoff::BackoffPolicy;
use crate::channel::ChannelConfig;
use crate::error::{Error, Result};
use crate::sync::PENDING_SLOT;

/// Default file name looked up in the user config directory.
pub const CONFIG_FILE_NAME: &str = "rolo.toml";

const APP_DIR_NAME: &str = "rolo";

/// Client configuration stored in `rolo.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the contacts API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Realtime channel endpoint.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Directory for durable slots. Defaults to the platform state dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How long a one-shot command waits for the realtime channel before
    /// going ahead without it, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Slot name holding the pending operation queue.
    #[serde(default = "default_queue_slot")]
    pub queue_slot: String,
    /// Reconnect schedule for the realtime channel.
    #[serde(default)]
    pub reconnect: BackoffPolicy,
    /// Schedule for the background flush loop. `max_attempts` also caps how
    /// often one queued operation is retried before it is dead-lettered.
    #[serde(default = "default_retry")]
    pub retry: BackoffPolicy,
    /// Flush the queue periodically while running, not only on reconnect.
    #[serde(default)]
    pub background_flush: bool,
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

fn default_queue_slot() -> String {
    PENDING_SLOT.to_string()
}

fn default_retry() -> BackoffPolicy {
    BackoffPolicy::exponential(Duration::from_secs(1), Duration::from_secs(60))
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: default_api_url(),
            ws_url: default_ws_url(),
            state_dir: None,
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            queue_slot: default_queue_slot(),
            reconnect: BackoffPolicy::default(),
            retry: default_retry(),
            background_flush: false,
        }
    }
}

impl Config {
    /// Loads configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        Self::parse(&content)
    }

    /// Parses and validates a TOML document.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `rolo.toml` from the user config directory, if there is one.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Config::default()),
        }
    }

    /// Saves configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (field, url, schemes) in [
            ("api_url", &self.api_url, ["http://", "https://"]),
            ("ws_url", &self.ws_url, ["ws://", "wss://"]),
        ] {
            if !schemes.iter().any(|s| url.starts_with(s)) {
                return Err(Error::Config(format!(
                    "invalid {} '{}': must start with {} or {}",
                    field, url, schemes[0], schemes[1]
                )));
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.queue_slot.is_empty()
            || !self
                .queue_slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::Config(format!(
                "invalid queue_slot '{}': use letters, digits, '-' or '_'",
                self.queue_slot
            )));
        }
        self.reconnect
            .validate()
            .map_err(|e| Error::Config(format!("[reconnect] {}", e)))?;
        self.retry
            .validate()
            .map_err(|e| Error::Config(format!("[retry] {}", e)))?;
        Ok(())
    }

    /// The state directory, falling back to `<platform state dir>/rolo`.
    pub fn state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_state_dir().ok_or(Error::NoStateDir),
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            url: self.ws_url.clone(),
            reconnect: self.reconnect.clone(),
        }
    }
}

/// `<config dir>/rolo/rolo.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// `<state dir>/rolo`. Platforms without a state dir fall back to the
/// local data dir.
pub fn default_state_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join(APP_DIR_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
