// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Every text frame that parses as an [`Envelope`] is relayed to all other
//! connected clients. Nothing is stored; a client that is offline when a
//! frame goes out never sees it.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use rolo_core::Envelope;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::hub::Hub;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Run the relay on the given address.
pub async fn run(addr: SocketAddr, hub: Hub) -> Result<(), BoxError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", listener.local_addr()?);
    serve(listener, hub).await
}

/// Accept connections from an already bound listener.
pub async fn serve(listener: TcpListener, hub: Hub) -> Result<(), BoxError> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let hub = hub.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, hub).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    hub: Hub,
) -> Result<(), BoxError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (peer, mut broadcast_rx) = hub.join();
    info!(
        "Peer {} connected from {} ({} connected)",
        peer,
        peer_addr,
        hub.peer_count()
    );

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    loop {
        tokio::select! {
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if accept_frame(text.as_str()) {
                            let delivered = hub.publish(peer, text.to_string());
                            debug!("Peer {} frame relayed to {} receivers", peer, delivered.saturating_sub(1));
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Peer {} disconnected", peer);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error from peer {}: {}", peer, e);
                        break;
                    }
                    None => {
                        info!("Peer {} stream ended", peer);
                        break;
                    }
                }
            }

            broadcast = broadcast_rx.recv() => {
                match broadcast {
                    Ok(frame) if frame.from == peer => {}
                    Ok(frame) => {
                        if let Err(e) = ws_sink.send(Message::Text(frame.text.into())).await {
                            warn!("Failed to relay to peer {}: {}", peer, e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("Peer {} lagged by {} frames", peer, n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Whether a client frame is a well-formed event worth relaying.
pub(crate) fn accept_frame(text: &str) -> bool {
    match Envelope::from_json(text) {
        Ok(envelope) => {
            debug!("Relaying {}", envelope.event_type().as_str());
            true
        }
        Err(e) => {
            debug!("Dropping malformed frame: {}", e);
            false
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
