//! Cron webhook trigger.

use axum::Json;
use axum::extract::{Query, State};
use axum::extract::rejection::QueryRejection;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use autopost_domain::{TriggerOutcome, TriggerSource};

use super::body::GenerationBody;
use super::error::ApiError;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    success: bool,
    message: String,
    #[serde(flatten)]
    generation: GenerationBody,
}

/// `GET|POST /api/cron/generate` - generate one post if automation is running.
///
/// The key is checked before the controller is consulted at all.
pub async fn trigger(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<WebhookQuery>, QueryRejection>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let query_key = query.ok().and_then(|Query(q)| q.key);
    state
        .auth
        .require_webhook(&headers, query_key.as_deref())
        .inspect_err(|_| tracing::warn!("Rejected cron webhook with invalid key"))?;

    let response = match state.controller.run_if_enabled(TriggerSource::Webhook).await? {
        TriggerOutcome::Disabled => WebhookResponse {
            success: true,
            message: "Automation is stopped, nothing generated".to_string(),
            generation: GenerationBody::skipped(),
        },
        TriggerOutcome::Generated(report) => WebhookResponse {
            success: true,
            message: format!("Generated '{}'", report.post.title),
            generation: GenerationBody::from(*report),
        },
    };

    Ok(Json(response))
}
