//! HTTP trigger surface: admin actions and the cron webhook.

mod auth;
mod automation;
mod body;
mod error;
mod state;
mod webhook;

pub use auth::{API_KEY_HEADER, SecretDigest};
pub use error::ApiError;
pub use state::{AppState, AuthConfig, SharedController};

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Build the top-level axum [`Router`].
///
/// `/health` is public; everything under `/api` checks a shared secret
/// first. Each request is traced at `DEBUG` via [`TraceLayer`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/automation",
            get(automation::status).post(automation::action),
        )
        .route(
            "/cron/generate",
            get(webhook::trigger).post(webhook::trigger),
        )
}

async fn health_check() -> &'static str {
    "OK"
}
