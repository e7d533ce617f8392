// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Serialized owner of target state
//!
//! The store runs as a single task that exclusively owns the [`Database`].
//! Every read and write goes through its mailbox, so at most one operation is
//! in flight. Probe notifications run as detached tasks; a delivered
//! notification is reported back through the same mailbox before the row is
//! touched.

use crate::probe::Notifier;
use chrono::Utc;
use sisyphus_domain_types::{derive_name, Action, Command, ProbeExtra, Target, TargetState};
use sisyphus_local_db::Database;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

const MAILBOX_CAPACITY: usize = 64;

pub(crate) const STORE_UNAVAILABLE: &str = "store unavailable";

enum StoreRequest {
    Execute {
        cmd: Command,
        reply: oneshot::Sender<Command>,
    },
    /// A probe notification to `url` was delivered at `at`; `dispatched` is
    /// the state the row was toggled to when the probe went out
    Probed {
        url: String,
        at: i64,
        dispatched: TargetState,
    },
}

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error("missing target url")]
    MissingTarget,

    #[error(transparent)]
    Storage(#[from] sisyphus_local_db::Error),
}

/// Cloneable entry point into the store task.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreRequest>,
}

impl StoreHandle {
    /// Run `cmd` against the store and return it completed in place.
    ///
    /// Failures never escape as errors: they come back in `cmd.error`.
    pub async fn execute(&self, cmd: Command) -> Command {
        let action = cmd.action.clone();
        let (reply, response) = oneshot::channel();
        let request = StoreRequest::Execute { cmd, reply };

        if let Err(mpsc::error::SendError(StoreRequest::Execute { mut cmd, .. })) =
            self.tx.send(request).await
        {
            cmd.fail(STORE_UNAVAILABLE);
            return cmd;
        }

        response.await.unwrap_or_else(|_| {
            let mut cmd = Command::new(action);
            cmd.fail(STORE_UNAVAILABLE);
            cmd
        })
    }
}

pub struct Store {
    db: Database,
    notifier: Arc<dyn Notifier>,
    period: Duration,
    requests: mpsc::Receiver<StoreRequest>,
    /// Handed to probe tasks; weak so the store stops once every handle is gone
    mailbox: mpsc::WeakSender<StoreRequest>,
}

impl Store {
    /// Start the store task. `period` is reported to clients on `ping`.
    pub fn spawn(db: Database, notifier: Arc<dyn Notifier>, period: Duration) -> StoreHandle {
        let (tx, requests) = mpsc::channel(MAILBOX_CAPACITY);
        let store = Store {
            db,
            notifier,
            period,
            requests,
            mailbox: tx.downgrade(),
        };
        tokio::spawn(store.run());
        StoreHandle { tx }
    }

    async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            match request {
                StoreRequest::Execute { cmd, reply } => {
                    let done = self.execute(cmd);
                    if reply.send(done).is_err() {
                        debug!("store caller went away before the reply");
                    }
                }
                StoreRequest::Probed { url, at, dispatched } => {
                    match self.db.targets().mark_pinged(&url, at, dispatched) {
                        Ok(0) => debug!(url = %url, "target changed since probe dispatch"),
                        Ok(_) => {}
                        Err(err) => error!(url = %url, error = %err, "could not record probe"),
                    }
                }
            }
        }
        debug!("store stopped");
    }

    fn execute(&self, mut cmd: Command) -> Command {
        let outcome = match cmd.action {
            Action::Hello => self.hello(&mut cmd),
            Action::Add => self.add(&mut cmd),
            Action::Ack => self.ack(&mut cmd),
            Action::Del => self.del(&cmd),
            Action::Ping => self.ping(&mut cmd),
            Action::Error | Action::Other(_) => return cmd,
        };

        if let Err(err) = outcome {
            warn!(action = %cmd.action, error = %err, "store command failed");
            cmd.fail(err.to_string());
        }
        cmd
    }

    fn hello(&self, cmd: &mut Command) -> Result<(), CommandError> {
        cmd.args = non_empty(self.db.targets().list()?);
        Ok(())
    }

    fn add(&self, cmd: &mut Command) -> Result<(), CommandError> {
        let target = operand_mut(cmd)?;
        if target.name.is_empty() {
            target.name = derive_name(&target.url);
        }
        let now = now();
        self.db.targets().insert(target, now)?;
        target.last_probed_at = now;
        target.state = TargetState::New;
        info!(url = %target.url, name = %target.name, "target registered");
        Ok(())
    }

    /// Acknowledging an unknown URL succeeds without touching any row.
    fn ack(&self, cmd: &mut Command) -> Result<(), CommandError> {
        let target = operand_mut(cmd)?;
        let now = now();
        if self.db.targets().acknowledge(&target.url, now)? == 0 {
            debug!(url = %target.url, "ack for unknown target");
        }
        target.last_probed_at = now;
        target.state = TargetState::Ack;
        Ok(())
    }

    fn del(&self, cmd: &Command) -> Result<(), CommandError> {
        let target = cmd
            .target()
            .filter(|t| !t.url.is_empty())
            .ok_or(CommandError::MissingTarget)?;
        if self.db.targets().delete(&target.url)? == 0 {
            debug!(url = %target.url, "delete for unknown target");
        }
        Ok(())
    }

    fn ping(&self, cmd: &mut Command) -> Result<(), CommandError> {
        cmd.args = non_empty(self.probe_all()?);
        cmd.extra = serde_json::to_value(ProbeExtra {
            period: self.period.as_secs(),
        })
        .ok();
        Ok(())
    }

    /// Toggle and persist every target's state, then dispatch one probe per
    /// target. Returns the toggled view.
    fn probe_all(&self) -> sisyphus_local_db::Result<Vec<Target>> {
        let store = self.db.targets();
        let mut targets = store.list()?;
        let version = now();

        for target in &mut targets {
            target.state = target.state.toggled();
            store.set_state(&target.url, target.state)?;
            self.dispatch_probe(target.url.clone(), target.state, version);
        }

        debug!(count = targets.len(), "probe cycle dispatched");
        Ok(targets)
    }

    fn dispatch_probe(&self, url: String, dispatched: TargetState, version: i64) {
        let notifier = Arc::clone(&self.notifier);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            match notifier.notify(&url, version).await {
                Ok(()) => {
                    if let Some(tx) = mailbox.upgrade() {
                        let probed = StoreRequest::Probed {
                            url,
                            at: now(),
                            dispatched,
                        };
                        let _ = tx.send(probed).await;
                    }
                }
                Err(err) => warn!(error = %err, "probe not delivered"),
            }
        });
    }
}

fn operand_mut(cmd: &mut Command) -> Result<&mut Target, CommandError> {
    cmd.args
        .first_mut()
        .filter(|t| !t.url.is_empty())
        .ok_or(CommandError::MissingTarget)
}

/// Keep list responses non-empty for clients that index the first element.
fn non_empty(targets: Vec<Target>) -> Vec<Target> {
    if targets.is_empty() {
        vec![Target::placeholder()]
    } else {
        targets
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}
