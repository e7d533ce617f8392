// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! One live WebSocket peer
//!
//! A connection runs a reader (this task) and a writer (spawned). The writer
//! drains the outbound queue that the hub broadcasts into; the reader parses
//! client commands, submits them to the hub and answers on the same socket.
//! Both halves share the socket sink behind a mutex.
//!
//! Lifecycle: registered with the hub once the upgrade completes, closed for
//! good on a read error, a malformed frame, or when the hub drops the queue.

use crate::error::ProtocolError;
use crate::hub::{ConnectionId, HubHandle};
use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use sisyphus_domain_types::{Action, Command};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

type SharedSink = Arc<Mutex<SplitSink<WebSocket, WsMessage>>>;

/// Drive `socket` until it closes.
pub async fn serve(socket: WebSocket, hub: HubHandle, queue_capacity: usize) {
    let id = Uuid::new_v4();
    let (sink, stream) = socket.split();
    let sink: SharedSink = Arc::new(Mutex::new(sink));
    let (outbound, queue) = mpsc::channel(queue_capacity);

    if hub.register(id, outbound).await.is_err() {
        warn!(conn_id = %id, "hub unavailable, refusing connection");
        let _ = sink.lock().await.close().await;
        return;
    }

    let writer = tokio::spawn(write_loop(id, Arc::clone(&sink), queue));
    read_loop(id, &hub, &sink, stream).await;

    // Once the hub drops its sender the writer drains what is left and exits.
    let _ = hub.unregister(id).await;
    let _ = writer.await;
    info!(conn_id = %id, "connection closed");
}

async fn write_loop(id: ConnectionId, sink: SharedSink, mut queue: mpsc::Receiver<Command>) {
    while let Some(cmd) = queue.recv().await {
        if let Err(err) = send_command(&sink, &cmd).await {
            debug!(conn_id = %id, error = %err, "socket write failed");
            break;
        }
    }
    let _ = sink.lock().await.close().await;
}

async fn read_loop(
    id: ConnectionId,
    hub: &HubHandle,
    sink: &SharedSink,
    mut stream: SplitStream<WebSocket>,
) {
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                warn!(conn_id = %id, error = %err, "reader failure");
                break;
            }
        };

        let cmd = match parse_frame(&text) {
            Ok(cmd) => cmd,
            Err(err) => {
                warn!(conn_id = %id, error = %err, frame = %text, "could not process command");
                break;
            }
        };

        let action = cmd.action.clone();
        let delivered = match action {
            Action::Hello => {
                let reply = hub.command(Command::new(Action::Hello)).await;
                send_command(sink, &reply).await.is_ok()
            }
            Action::Ack | Action::Del => {
                let reply = hub.command(cmd).await;
                send_command(sink, &reply).await.is_ok()
            }
            // Probe results interest every observer; the requester's copy
            // arrives through its own queue like everyone else's.
            Action::Ping => {
                let reply = hub.command(cmd).await;
                hub.broadcast(reply).await.is_ok()
            }
            Action::Add | Action::Error | Action::Other(_) => {
                warn!(conn_id = %id, action = %action, "unknown command sent from client");
                true
            }
        };

        if !delivered {
            break;
        }
    }
}

pub(crate) fn parse_frame(text: &str) -> Result<Command, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

async fn send_command(sink: &SharedSink, cmd: &Command) -> Result<(), axum::Error> {
    let text = serde_json::to_string(cmd).map_err(axum::Error::new)?;
    sink.lock().await.send(WsMessage::Text(text)).await
}
