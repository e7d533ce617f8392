// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Table definition

use rusqlite::Connection;

/// One row per target. `version` is reserved and never written.
pub const CREATE_PINGS: &str = "create table if not exists pings (
    url text primary key,
    name text,
    version integer,
    pinged integer,
    state text
);";

pub fn initialize(conn: &Connection) -> crate::Result<()> {
    conn.execute_batch(CREATE_PINGS)?;
    Ok(())
}
