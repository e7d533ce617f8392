// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The uniform request/response message
//!
//! A command travels from a caller to the store and comes back as its own
//! response: the store fills in `arg`, `xtra` or `error` in place. The same
//! JSON object is used for socket frames in both directions.

use crate::target::Target;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::EnumString;

/// Requested operation.
///
/// Parsing is ASCII case-insensitive. Unrecognised strings are kept in
/// [`Action::Other`] so that an unknown action is not a malformed frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Hello,
    Add,
    Ack,
    Del,
    Ping,
    Error,
    #[strum(default)]
    Other(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Hello => "hello",
            Action::Add => "add",
            Action::Ack => "ack",
            Action::Del => "del",
            Action::Ping => "ping",
            Action::Error => "error",
            Action::Other(raw) => raw,
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::Other(String::new())
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(action) => action,
            Err(_) => Action::Other(value),
        }
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side payload attached to `ping` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeExtra {
    /// Probe interval in seconds
    #[serde(rename = "Period")]
    pub period: u64,
}

/// Request and response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub action: Action,

    /// Operands; `add`, `ack` and `del` carry exactly one target
    #[serde(rename = "arg", default, deserialize_with = "null_as_empty")]
    pub args: Vec<Target>,

    /// Opaque auxiliary payload, e.g. [`ProbeExtra`] on `ping`
    #[serde(rename = "xtra", default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,

    /// Non-empty when the operation failed
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl Command {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    pub fn with_target(action: Action, target: Target) -> Self {
        Self {
            action,
            args: vec![target],
            ..Default::default()
        }
    }

    /// First operand, if any.
    pub fn target(&self) -> Option<&Target> {
        self.args.first()
    }

    pub fn is_err(&self) -> bool {
        !self.error.is_empty()
    }

    /// Mark the command as failed.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = message.into();
    }

    /// Decode the `xtra` payload of a `ping` response.
    pub fn probe_extra(&self) -> Option<ProbeExtra> {
        self.extra
            .as_ref()
            .and_then(|extra| serde_json::from_value(extra.clone()).ok())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Target>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Target>>::deserialize(deserializer)?.unwrap_or_default())
}
