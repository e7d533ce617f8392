// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Sisyphus target liveness server
//!
//! Clients register target URLs over HTTP. A periodic prober pushes a
//! `version=<epoch>` notification to every target and the resulting state of
//! each target is broadcast to all WebSocket observers. Two actors carry the
//! state: the [`store`] owns the SQLite table, and the [`hub`] owns the
//! connection registry and is the single path into the store.

pub mod config;
pub mod connection;
pub mod dependencies;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod probe;
pub mod prober;
pub mod server;
pub mod state;
pub mod store;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use hub::{Hub, HubHandle};
pub use probe::{HttpNotifier, Notifier, ProbeError};
pub use server::Server;
pub use store::{Store, StoreHandle};
