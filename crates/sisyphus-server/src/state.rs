// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server state management

use crate::config::ServerConfig;
use crate::hub::HubHandle;

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    /// Entry point for every store command and broadcast
    pub hub: HubHandle,

    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Get hub reference
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Get configuration reference
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
