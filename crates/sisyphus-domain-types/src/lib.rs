// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Domain types shared by the sisyphus storage layer and server
//!
//! A [`Target`] is a remotely registered callback URL that the server probes
//! for liveness. Every request and response exchanged with the store, the hub
//! and socket clients is a [`Command`].

pub mod command;
pub mod target;

pub use command::{Action, Command, ProbeExtra};
pub use target::{derive_name, Target, TargetState};
