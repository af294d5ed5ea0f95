// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn rolo() -> Command {
    cargo_bin_cmd!("rolo")
}

/// `rolo` with its state directory pointed at `state` and the given config.
pub fn rolo_in(state: &Path, config: &Path) -> Command {
    let mut cmd = rolo();
    cmd.arg("--state-dir")
        .arg(state)
        .arg("--config")
        .arg(config)
        .env_remove("RUST_LOG");
    cmd
}

/// Write a rolo.toml pointing at `api_url`, with a closed realtime port.
pub fn write_config(dir: &Path, api_url: &str) -> std::path::PathBuf {
    let path = dir.join("rolo.toml");
    std::fs::write(
        &path,
        format!(
            "api_url = \"{}\"\nws_url = \"ws://127.0.0.1:1/ws\"\nconnect_timeout_ms = 50\nrequest_timeout_ms = 2000\n",
            api_url
        ),
    )
    .unwrap();
    path
}

/// One request as seen by [`StubServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query string, e.g. `/contacts?page=1&limit=20`.
    pub target: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Minimal HTTP/1.1 server answering with queued canned responses.
///
/// Runs on its own thread so it serves both async tests and the `rolo`
/// binary. When the queue is empty it answers 503.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responses: Arc<Mutex<VecDeque<(u16, String)>>>,
}

impl StubServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responses = Arc::new(Mutex::new(VecDeque::new()));

        let seen = Arc::clone(&requests);
        let canned = Arc::clone(&responses);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let Some(request) = read_request(&stream) else {
                    continue;
                };
                seen.lock().unwrap().push(request);
                let (status, body) = canned
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or((503, "no response queued".to_string()));
                write_response(stream, status, &body);
            }
        });

        StubServer {
            addr,
            requests,
            responses,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back((status, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &TcpStream) -> Option<RecordedRequest> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .ok()?;
    let mut reader = BufReader::new(stream);

    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut content_length = 0;
    let mut authorization = None;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().ok()?,
                "authorization" => authorization = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).ok()?;

    Some(RecordedRequest {
        method,
        target,
        authorization,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn write_response(mut stream: TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// JSON body of a contact as the service returns it.
pub fn contact_json(id: i64, name: &str) -> String {
    serde_json::json!({
        "id": id,
        "name": name,
        "phone": "0712345678",
        "email": "ana@example.com",
        "notes": null,
        "tag": null,
        "last_transaction": 0.0,
        "transaction_history": [],
    })
    .to_string()
}

/// JSON body of a one-page listing.
pub fn page_json(contacts: &[(i64, &str)]) -> String {
    let items: Vec<serde_json::Value> = contacts
        .iter()
        .map(|(id, name)| serde_json::from_str(&contact_json(*id, name)).unwrap())
        .collect();
    serde_json::json!({
        "items": items,
        "total": contacts.len(),
        "page": 1,
        "limit": 20,
        "pages": 1,
    })
    .to_string()
}
