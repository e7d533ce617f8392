// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Storage errors

/// Result alias for storage operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A target with this URL is already registered
    #[error("target already registered: {0}")]
    Conflict(String),

    /// No target with this URL exists
    #[error("target not found: {0}")]
    NotFound(String),

    /// The table could not be read or written
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}
