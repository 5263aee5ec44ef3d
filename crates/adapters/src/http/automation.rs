//! JSON handlers for the authenticated automation actions.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use autopost_domain::usecases::AutomationError;
use autopost_domain::{IntervalMinutes, TriggerOutcome, TriggerSource};

use super::body::{GenerationBody, RuntimeBody, StatusBody};
use super::error::ApiError;
use super::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Stop,
    Status,
    Execute,
}

/// Request body for `POST /api/automation`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub action: Action,
    pub interval_minutes: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    success: bool,
    action: Action,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<StatusBody>,
    runtime: RuntimeBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation: Option<GenerationBody>,
}

/// `GET /api/automation` - persisted status plus this process's runtime view.
pub async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ActionResponse>, ApiError> {
    state.auth.require_admin(&headers)?;

    respond(&state, Action::Status, "Automation status".to_string(), None).await
}

/// `POST /api/automation` - start, stop, status, or execute.
pub async fn action(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    state.auth.require_admin(&headers)?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let controller = &state.controller;

    match request.action {
        Action::Start => {
            let interval = request
                .interval_minutes
                .map(IntervalMinutes::from_signed)
                .transpose()
                .map_err(AutomationError::from)?;
            let status = controller.start(interval).await?;
            let message = format!(
                "Automation started, generating every {} minutes",
                status.interval_minutes.get()
            );
            respond(&state, Action::Start, message, None).await
        }
        Action::Stop => {
            controller.stop().await?;
            respond(&state, Action::Stop, "Automation stopped".to_string(), None).await
        }
        Action::Status => {
            respond(&state, Action::Status, "Automation status".to_string(), None).await
        }
        Action::Execute => {
            let outcome = controller.run_if_enabled(TriggerSource::Action).await?;
            let (message, generation) = match outcome {
                TriggerOutcome::Disabled => (
                    "Automation is stopped, nothing generated".to_string(),
                    GenerationBody::skipped(),
                ),
                TriggerOutcome::Generated(report) => (
                    format!("Generated '{}'", report.post.title),
                    GenerationBody::from(*report),
                ),
            };
            // Post is already saved and counted; report it even if the re-read fails.
            let status = match controller.status().await {
                Ok(status) => Some(status.into()),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read status after execute");
                    None
                }
            };
            Ok(build(&state, Action::Execute, message, status, Some(generation)))
        }
    }
}

async fn respond(
    state: &AppState,
    action: Action,
    message: String,
    generation: Option<GenerationBody>,
) -> Result<Json<ActionResponse>, ApiError> {
    let status = state.controller.status().await?;
    Ok(build(state, action, message, Some(status.into()), generation))
}

fn build(
    state: &AppState,
    action: Action,
    message: String,
    status: Option<StatusBody>,
    generation: Option<GenerationBody>,
) -> Json<ActionResponse> {
    Json(ActionResponse {
        success: true,
        action,
        message,
        status,
        runtime: state.controller.runtime().into(),
        generation,
    })
}
