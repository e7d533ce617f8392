// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Timer-driven probe cycles

use crate::hub::{HubHandle, HubStopped};
use sisyphus_domain_types::{Action, Target};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

pub struct Prober;

impl Prober {
    /// Run a probe cycle every `period`, the first one a full period after start.
    ///
    /// The task ends once the hub is gone.
    pub fn spawn(hub: HubHandle, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_secs = period.as_secs(), "prober started");

            loop {
                ticker.tick().await;
                if probe_once(&hub).await.is_err() {
                    break;
                }
            }
            info!("prober stopped");
        })
    }
}

/// Submit one `ping` and broadcast its outcome.
pub async fn probe_once(hub: &HubHandle) -> Result<(), HubStopped> {
    let result = hub.proxy(Action::Ping, Target::placeholder()).await;
    debug!(targets = result.args.len(), error = %result.error, "probe cycle done");
    hub.broadcast(result).await
}
