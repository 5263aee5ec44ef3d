//! Shared state for axum handlers

use std::sync::Arc;

use autopost_domain::usecases::AutomationController;
use autopost_domain::{Clock, ContentGenerator, PostRepository, StatusStore};

use super::auth::SecretDigest;

/// Controller over type-erased ports, as wired by the binary
pub type SharedController =
    AutomationController<dyn StatusStore, dyn ContentGenerator, dyn PostRepository, dyn Clock>;

/// Credentials checked by the trigger endpoints.
///
/// An unset secret rejects every request to the endpoints it guards.
#[derive(Debug, Default)]
pub struct AuthConfig {
    /// Bearer token for `/api/automation`
    pub admin_token: Option<SecretDigest>,
    /// Shared key for `/api/cron/generate`
    pub webhook_key: Option<SecretDigest>,
}

/// Application state shared across all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: SharedController,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(controller: SharedController, auth: AuthConfig) -> Self {
        Self {
            controller,
            auth: Arc::new(auth),
        }
    }
}
