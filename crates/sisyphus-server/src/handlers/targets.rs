// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Target registration and acknowledgement endpoints
//!
//! Every outcome is broadcast to the live connections: the completed command
//! on success, or the same command re-tagged `error` on failure.

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::FormRejection, State},
    http::{Method, StatusCode},
    Form, Json,
};
use serde::Deserialize;
use sisyphus_domain_types::{Action, Command, Target, TargetState};
use tracing::{debug, error, info};

const MISSING_URL: &str = r#"Missing "sp" url value"#;

/// Form fields accepted by `/reg` and `/ack`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TargetForm {
    /// Target URL
    pub sp: String,
    pub name: String,
    /// Explicit `ack` or `del`, overriding the request method on `/ack`
    pub action: Option<String>,
}

impl TargetForm {
    fn from_request(form: Result<Form<TargetForm>, FormRejection>) -> Self {
        match form {
            Ok(Form(form)) => form,
            Err(rejection) => {
                debug!(error = %rejection, "unreadable form body");
                Self::default()
            }
        }
    }

    fn target(self) -> ServerResult<Target> {
        if self.sp.is_empty() {
            error!(r#"Please POST the target url as "sp""#);
            return Err(ServerError::BadRequest(MISSING_URL.to_string()));
        }
        Ok(Target::new(self.sp, self.name))
    }
}

/// `POST /reg`: register a new target
pub async fn register(
    State(state): State<AppState>,
    form: Result<Form<TargetForm>, FormRejection>,
) -> ServerResult<Json<Command>> {
    let target = TargetForm::from_request(form).target()?;
    info!(url = %target.url, "registering target");
    submit(&state, Action::Add, target).await
}

/// `POST /ack` acknowledges, `DELETE /ack` deletes
pub async fn acknowledge(
    State(state): State<AppState>,
    method: Method,
    form: Result<Form<TargetForm>, FormRejection>,
) -> ServerResult<Json<Command>> {
    let form = TargetForm::from_request(form);
    let action = resolve_action(&method, form.action.as_deref())?;

    let mut target = form.target()?;
    if action == Action::Ack {
        target.state = TargetState::Ack;
    }
    info!(url = %target.url, %action, "acknowledging target");
    submit(&state, action, target).await
}

/// `OPTIONS` on either endpoint
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn resolve_action(method: &Method, requested: Option<&str>) -> ServerResult<Action> {
    let fallback = if method == Method::DELETE {
        Action::Del
    } else {
        Action::Ack
    };

    match requested.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(fallback),
        Some(raw) => match Action::from(raw.to_string()) {
            action @ (Action::Ack | Action::Del) => Ok(action),
            other => Err(ServerError::BadRequest(format!(
                "unsupported action \"{other}\", expected ack or del"
            ))),
        },
    }
}

async fn submit(state: &AppState, action: Action, target: Target) -> ServerResult<Json<Command>> {
    let mut reply = state.hub().proxy(action, target).await;

    if reply.is_err() {
        error!(action = %reply.action, error = %reply.error, "could not update target");
        let detail = reply.error.clone();
        reply.action = Action::Error;
        let _ = state.hub().broadcast(reply).await;
        return Err(ServerError::Store(detail));
    }

    let _ = state.hub().broadcast(reply.clone()).await;
    Ok(Json(reply))
}
