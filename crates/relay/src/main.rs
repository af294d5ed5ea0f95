// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rolo-relay: WebSocket relay for rolo realtime events.
//!
//! Clients publish an event after each successful change; the relay forwards
//! it to every other connected client. It keeps no state between frames.

mod hub;
mod server;

use std::net::SocketAddr;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hub::Hub;

/// rolo-relay: realtime event relay for rolo clients
#[derive(Parser, Debug)]
#[command(name = "rolo-relay")]
#[command(about = "WebSocket relay that fans rolo events out to connected clients")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Frames a slow client may fall behind before it drops some
    #[arg(long, default_value_t = hub::DEFAULT_CAPACITY)]
    capacity: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting rolo-relay");
    info!("  Bind address: {}", args.bind);

    server::run(args.bind, Hub::new(args.capacity.max(1))).await
}
