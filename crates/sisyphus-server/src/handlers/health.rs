// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Health check endpoints

use crate::state::AppState;
use crate::{ServerError, ServerResult};
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Readiness response
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: String,
    /// Live WebSocket connections registered with the hub
    pub connections: usize,
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> ServerResult<Json<HealthResponse>> {
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Ok(Json(response))
}

/// Readiness check endpoint; fails once the hub has stopped
pub async fn readiness_check(
    State(state): State<AppState>,
) -> ServerResult<Json<ReadinessResponse>> {
    let connections = state
        .hub()
        .connection_count()
        .await
        .map_err(|err| ServerError::Internal(err.to_string()))?;

    Ok(Json(ReadinessResponse {
        status: "ready".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        connections,
    }))
}

/// Version endpoint
pub async fn version() -> ServerResult<Json<VersionResponse>> {
    Ok(Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
