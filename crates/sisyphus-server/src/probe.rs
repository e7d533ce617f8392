// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Outbound probe notifications
//!
//! A probe is a single HTTP `PUT` to the target's URL whose form body carries
//! the sender's clock as a version token. Delivery is attempted once per probe
//! cycle; there is no retry.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The notification could not be delivered (connect, timeout, TLS, ...)
    #[error("probe to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Delivery of probe notifications, injectable so the store can be driven
/// without network access.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, url: &str, version: i64) -> Result<(), ProbeError>;
}

/// Notifier backed by a shared `reqwest` client with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, url: &str, version: i64) -> Result<(), ProbeError> {
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!("version={version}"))
            .send()
            .await
            .map_err(|source| ProbeError::Transport {
                url: url.to_string(),
                source,
            })?;

        // Any answer means the push endpoint is reachable.
        tracing::debug!(url, status = %response.status(), "probe delivered");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Notifier with a fixed outcome that records every URL it was asked to probe.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedNotifier {
        pub(crate) deliver: bool,
        /// Always fail these URLs, whatever `deliver` says
        pub(crate) undeliverable: Vec<String>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl ScriptedNotifier {
        pub(crate) fn delivering() -> Self {
            Self {
                deliver: true,
                ..Default::default()
            }
        }

        pub(crate) fn delivering_except(urls: &[&str]) -> Self {
            Self {
                deliver: true,
                undeliverable: urls.iter().map(|url| url.to_string()).collect(),
                ..Default::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self::default()
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for ScriptedNotifier {
        async fn notify(&self, url: &str, _version: i64) -> Result<(), ProbeError> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.deliver && !self.undeliverable.iter().any(|u| u == url) {
                return Ok(());
            }
            // A relative URL fails inside reqwest without touching the network.
            let source = reqwest::Client::new()
                .put("unreachable")
                .send()
                .await
                .expect_err("relative urls are rejected");
            Err(ProbeError::Transport {
                url: url.to_string(),
                source,
            })
        }
    }
}
