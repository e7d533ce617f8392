// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::connection;
use crate::state::AppState;
use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    response::Response,
};
use std::net::SocketAddr;
use tracing::info;

/// Upgrade `GET /ws` into a live connection.
pub async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    info!(%peer, "websocket upgrade");
    let hub = state.hub().clone();
    let capacity = state.config().outbound_queue_capacity;
    ws.on_upgrade(move |socket| connection::serve(socket, hub, capacity))
}
