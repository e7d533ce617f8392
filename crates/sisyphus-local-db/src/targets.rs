// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! CRUD over the `pings` table

use crate::{Error, Result};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use sisyphus_domain_types::{Target, TargetState};

const SELECT_COLUMNS: &str = "select url, name, pinged, state from pings";

/// Borrowing view over the target table.
pub struct TargetStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> TargetStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Insert a new target in state `new`.
    ///
    /// An existing row with the same URL is left untouched and
    /// [`Error::Conflict`] is returned.
    pub fn insert(&self, target: &Target, pinged_at: i64) -> Result<()> {
        let inserted = self.conn.execute(
            "insert into pings (url, name, pinged, state) values (?1, ?2, ?3, ?4)",
            params![target.url, target.name, pinged_at, TargetState::New.as_ref()],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Err(Error::Conflict(target.url.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Mark a target acknowledged. Returns the number of rows touched.
    pub fn acknowledge(&self, url: &str, at: i64) -> Result<usize> {
        Ok(self.conn.execute(
            "update pings set state = ?2, pinged = ?3 where url = ?1",
            params![url, TargetState::Ack.as_ref(), at],
        )?)
    }

    /// Remove a target. Returns the number of rows removed.
    pub fn delete(&self, url: &str) -> Result<usize> {
        Ok(self.conn.execute("delete from pings where url = ?1", params![url])?)
    }

    pub fn list(&self) -> Result<Vec<Target>> {
        let mut stmt = self.conn.prepare(SELECT_COLUMNS)?;
        let rows = stmt.query_map([], row_to_target)?;
        let mut targets = Vec::new();
        for row in rows {
            targets.push(row?);
        }
        Ok(targets)
    }

    pub fn get(&self, url: &str) -> Result<Option<Target>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} where url = ?1"))?;
        Ok(stmt.query_row(params![url], row_to_target).optional()?)
    }

    /// Fetch a target, treating absence as [`Error::NotFound`].
    pub fn require(&self, url: &str) -> Result<Target> {
        self.get(url)?.ok_or_else(|| Error::NotFound(url.to_string()))
    }

    pub fn set_state(&self, url: &str, state: TargetState) -> Result<usize> {
        Ok(self.conn.execute(
            "update pings set state = ?2 where url = ?1",
            params![url, state.as_ref()],
        )?)
    }

    /// Record a delivered probe notification.
    ///
    /// Applies only while the row is still in `dispatched`, the state it was
    /// toggled to when the probe went out. Returns 0 when anything changed the
    /// row in between (an ack, a delete or a later cycle).
    pub fn mark_pinged(&self, url: &str, at: i64, dispatched: TargetState) -> Result<usize> {
        Ok(self.conn.execute(
            "update pings set pinged = ?2, state = ?3 where url = ?1 and state = ?4",
            params![url, at, TargetState::Ping.as_ref(), dispatched.as_ref()],
        )?)
    }
}

fn row_to_target(row: &Row<'_>) -> rusqlite::Result<Target> {
    let state: Option<String> = row.get(3)?;
    let state = match state.as_deref().map(str::parse::<TargetState>) {
        Some(Ok(state)) => state,
        Some(Err(_)) => {
            tracing::warn!(state = ?state, "unrecognised target state in database");
            TargetState::Unset
        }
        None => TargetState::Unset,
    };

    Ok(Target {
        url: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        last_probed_at: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
        state,
    })
}
