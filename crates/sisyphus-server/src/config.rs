// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Outbound queue size per socket connection.
pub const DEFAULT_OUTBOUND_QUEUE_CAPACITY: usize = 255;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP and WebSocket listener to
    pub bind_addr: SocketAddr,

    /// Path to the SQLite target table, or `:memory:`
    pub database_path: String,

    /// Interval between probe cycles
    pub probe_period: Duration,

    /// Client-side timeout for a single probe notification
    pub probe_timeout: Duration,

    /// Per-connection outbound queue size; a connection whose queue is full
    /// when a broadcast arrives is dropped
    pub outbound_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_path: "sisyphus.db".to_string(),
            probe_period: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            outbound_queue_capacity: DEFAULT_OUTBOUND_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn in_memory(&self) -> bool {
        self.database_path == ":memory:"
    }
}
