// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Connection registry, broadcast fan-out and the only path into the store
//!
//! The hub is one task draining one mailbox. Registry changes, broadcasts and
//! store commands are handled strictly one at a time in arrival order, so the
//! registry map needs no lock and is never touched outside [`Hub::run`].

use crate::store::StoreHandle;
use sisyphus_domain_types::{Action, Command, Target};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

const MAILBOX_CAPACITY: usize = 256;

pub(crate) const HUB_STOPPED: &str = "hub is not running";

/// Identity of one registered socket connection.
pub type ConnectionId = Uuid;

/// Sending half of a connection's outbound queue.
pub type Outbound = mpsc::Sender<Command>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("hub is not running")]
pub struct HubStopped;

enum HubEvent {
    Register { id: ConnectionId, outbound: Outbound },
    Unregister { id: ConnectionId },
    Broadcast { cmd: Command },
    Command { cmd: Command, reply: oneshot::Sender<Command> },
    Count { reply: oneshot::Sender<usize> },
}

/// Cloneable handle used by connections, HTTP handlers and the prober.
#[derive(Clone)]
pub struct HubHandle {
    events: mpsc::Sender<HubEvent>,
}

impl HubHandle {
    async fn send(&self, event: HubEvent) -> Result<(), HubStopped> {
        self.events.send(event).await.map_err(|_| HubStopped)
    }

    pub async fn register(&self, id: ConnectionId, outbound: Outbound) -> Result<(), HubStopped> {
        self.send(HubEvent::Register { id, outbound }).await
    }

    /// Remove `id` and close its outbound queue. Unknown ids are ignored.
    pub async fn unregister(&self, id: ConnectionId) -> Result<(), HubStopped> {
        self.send(HubEvent::Unregister { id }).await
    }

    pub async fn broadcast(&self, cmd: Command) -> Result<(), HubStopped> {
        self.send(HubEvent::Broadcast { cmd }).await
    }

    /// Execute `cmd` against the store, ordered with every other hub event.
    pub async fn command(&self, cmd: Command) -> Command {
        let action = cmd.action.clone();
        let (reply, response) = oneshot::channel();
        let delivered = self.send(HubEvent::Command { cmd, reply }).await;

        match delivered {
            Ok(()) => response.await.unwrap_or_else(|_| stopped(action)),
            Err(HubStopped) => stopped(action),
        }
    }

    /// Submit a single-target command and wait for the completed response.
    pub async fn proxy(&self, action: Action, target: Target) -> Command {
        self.command(Command::with_target(action, target)).await
    }

    pub async fn connection_count(&self) -> Result<usize, HubStopped> {
        let (reply, response) = oneshot::channel();
        self.send(HubEvent::Count { reply }).await?;
        response.await.map_err(|_| HubStopped)
    }
}

fn stopped(action: Action) -> Command {
    let mut cmd = Command::new(action);
    cmd.fail(HUB_STOPPED);
    cmd
}

pub struct Hub {
    connections: HashMap<ConnectionId, Outbound>,
    store: StoreHandle,
    events: mpsc::Receiver<HubEvent>,
}

impl Hub {
    /// Start the hub task in front of `store`. It runs until every handle is dropped.
    pub fn spawn(store: StoreHandle) -> HubHandle {
        let (tx, events) = mpsc::channel(MAILBOX_CAPACITY);
        let hub = Hub {
            connections: HashMap::new(),
            store,
            events,
        };
        tokio::spawn(hub.run());
        HubHandle { events: tx }
    }

    async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            match event {
                HubEvent::Register { id, outbound } => {
                    info!(conn_id = %id, "registering connection");
                    self.connections.insert(id, outbound);
                }
                HubEvent::Unregister { id } => {
                    // Dropping the sender closes the queue and stops the writer.
                    if self.connections.remove(&id).is_some() {
                        info!(conn_id = %id, "unregistering connection");
                    }
                }
                HubEvent::Broadcast { cmd } => self.broadcast(&cmd),
                HubEvent::Command { cmd, reply } => {
                    debug!(action = %cmd.action, "proxying command");
                    let done = self.store.execute(cmd).await;
                    let _ = reply.send(done);
                }
                HubEvent::Count { reply } => {
                    let _ = reply.send(self.connections.len());
                }
            }
        }
        debug!("hub stopped");
    }

    /// Enqueue `cmd` on every registered connection without waiting.
    ///
    /// A connection whose queue is full or already closed is dropped from the
    /// registry; its writer then winds down on its own.
    fn broadcast(&mut self, cmd: &Command) {
        debug!(action = %cmd.action, connections = self.connections.len(), "broadcasting");
        let mut dropped = Vec::new();

        for (id, outbound) in &self.connections {
            match outbound.try_send(cmd.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(conn_id = %id, "slow consumer, dropping connection");
                    dropped.push(*id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dropped.push(*id);
                }
            }
        }

        for id in dropped {
            self.connections.remove(&id);
        }
    }
}
