// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Target records and their lifecycle states

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Number of trailing characters kept when a display name is derived from a URL.
const DERIVED_NAME_LEN: usize = 8;

/// Lifecycle marker of a target.
///
/// The text form is used both on the wire and in the `state` column.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetState {
    /// Freshly registered, never probed
    New,
    /// Last probe notification was delivered (or is outstanding)
    Ping,
    /// Two probe cycles passed without a delivered notification
    Offline,
    /// The target acknowledged a notification
    Ack,
    /// No state; used by placeholder targets and client frames that omit it
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    Unset,
}

impl TargetState {
    /// State a target moves to at the start of a probe cycle.
    ///
    /// A target that is still in `ping` from the previous cycle never
    /// confirmed delivery and is marked `offline`; anything else is pinged.
    pub fn toggled(self) -> Self {
        match self {
            TargetState::Ping => TargetState::Offline,
            _ => TargetState::Ping,
        }
    }
}

/// A tracked remote endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Callback URL, the primary key
    #[serde(rename = "URL", default)]
    pub url: String,

    /// Display label
    #[serde(rename = "Name", default)]
    pub name: String,

    /// Epoch seconds of the last delivered probe (or registration)
    #[serde(rename = "Pinged", default)]
    pub last_probed_at: i64,

    #[serde(rename = "State", default)]
    pub state: TargetState,
}

impl Target {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// The all-empty target used to keep list responses non-empty.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

/// Default display name for a target URL: the last characters of its final
/// non-empty path segment.
pub fn derive_name(raw: &str) -> String {
    let segment = match url::Url::parse(raw) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .unwrap_or_default(),
        Err(_) => raw
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string(),
    };

    let count = segment.chars().count();
    segment.chars().skip(count.saturating_sub(DERIVED_NAME_LEN)).collect()
}
