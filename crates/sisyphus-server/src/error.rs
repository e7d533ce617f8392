// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Server result type
pub type ServerResult<T> = Result<T, ServerError>;

/// HTTP-facing errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A store command came back with its error field set
    #[error("Store rejected command: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Problem+JSON style error body
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDetails {
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Store(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_problem(&self) -> ProblemDetails {
        let (title, detail) = match self {
            ServerError::BadRequest(msg) => ("Bad Request", msg.clone()),
            ServerError::Store(msg) => ("Could not add ping.", msg.clone()),
            ServerError::Internal(msg) => ("Internal Server Error", msg.clone()),
        };
        ProblemDetails {
            title: title.to_string(),
            status: self.status().as_u16(),
            detail,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_problem())).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {}", err))
    }
}

/// Inbound socket frame that could not be decoded. Fatal to that connection only.
#[derive(Debug, thiserror::Error)]
#[error("malformed frame: {source}")]
pub struct ProtocolError {
    #[from]
    source: serde_json::Error,
}
