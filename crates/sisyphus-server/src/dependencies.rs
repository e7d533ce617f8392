// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Dependency wiring for the server

use crate::{
    config::ServerConfig,
    hub::Hub,
    probe::{HttpNotifier, Notifier},
    prober::Prober,
    state::AppState,
    store::Store,
};
use anyhow::{ensure, Context, Result};
use sisyphus_local_db::Database;
use std::sync::Arc;
use tracing::info;

/// Default dependency builder: SQLite store, HTTP notifier and the background actors
pub struct DefaultServerDependencies {
    state: AppState,
}

impl DefaultServerDependencies {
    /// Build default dependencies and start the store, hub and prober tasks
    pub fn new(config: ServerConfig) -> Result<Self> {
        let notifier = HttpNotifier::new(config.probe_timeout)
            .context("failed to build probe HTTP client")?;
        Self::with_notifier(config, Arc::new(notifier))
    }

    /// Same wiring with a caller-supplied probe notifier
    pub fn with_notifier(config: ServerConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        ensure!(!config.probe_period.is_zero(), "probe period must be positive");

        let db = if config.in_memory() {
            Database::open_in_memory()?
        } else {
            Database::open(&config.database_path)
                .with_context(|| format!("failed to open database {}", config.database_path))?
        };
        info!(path = %config.database_path, "database ready");

        let store = Store::spawn(db, notifier, config.probe_period);
        let hub = Hub::spawn(store);
        Prober::spawn(hub.clone(), config.probe_period);

        Ok(Self {
            state: AppState { hub, config },
        })
    }

    /// Consume the dependency builder and return the resulting app state
    pub fn into_state(self) -> AppState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::testing::ScriptedNotifier;
    use std::time::Duration;

    fn in_memory(probe_period: Duration) -> ServerConfig {
        ServerConfig {
            database_path: ":memory:".to_string(),
            probe_period,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn zero_probe_period_is_rejected() {
        let built = DefaultServerDependencies::with_notifier(
            in_memory(Duration::ZERO),
            Arc::new(ScriptedNotifier::failing()),
        );
        let err = built.err().expect("zero period must fail");
        assert!(err.to_string().contains("probe period"), "{err}");
    }

    #[tokio::test]
    async fn in_memory_wiring_starts_the_hub() {
        let state = DefaultServerDependencies::with_notifier(
            in_memory(Duration::from_secs(60)),
            Arc::new(ScriptedNotifier::failing()),
        )
        .expect("deps")
        .into_state();
        assert_eq!(state.hub().connection_count().await.unwrap(), 0);
    }
}
