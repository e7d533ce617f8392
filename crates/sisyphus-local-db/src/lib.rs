// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! SQLite persistence for tracked targets
//!
//! The database holds a single `pings` table keyed by target URL. A
//! [`Database`] owns exactly one connection; callers that need serialized
//! access (the server's store actor) own the `Database` value outright.

pub mod error;
pub mod schema;
pub mod targets;

use rusqlite::Connection;
use std::path::Path;

pub use error::{Error, Result};
pub use targets::TargetStore;

/// Handle to the on-disk (or in-memory) target table.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "opened target database");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database; used by tests and `:memory:` configs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Table-level operations over this database.
    pub fn targets(&self) -> TargetStore<'_> {
        TargetStore::new(&self.conn)
    }
}
