//! Shared-secret checks for trigger endpoints

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use super::error::ApiError;
use super::state::AuthConfig;

pub const API_KEY_HEADER: &str = "x-api-key";

/// SHA-256 digest of a configured secret.
///
/// Candidates are hashed too; only digests are ever compared.
#[derive(Clone)]
pub struct SecretDigest([u8; 32]);

impl SecretDigest {
    pub fn new(secret: &SecretString) -> Self {
        Self(Sha256::digest(secret.expose_secret().as_bytes()).into())
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        self.0
            .iter()
            .zip(candidate.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for SecretDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretDigest(..)")
    }
}

fn check(expected: Option<&SecretDigest>, provided: Option<&str>) -> Result<(), ApiError> {
    match (expected, provided) {
        (Some(expected), Some(provided)) if expected.matches(provided) => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

impl AuthConfig {
    /// Require `Authorization: Bearer <admin token>`
    pub fn require_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        check(self.admin_token.as_ref(), token)
    }

    /// Require the webhook key in the `x-api-key` header or `key` query parameter
    pub fn require_webhook(
        &self,
        headers: &HeaderMap,
        query_key: Option<&str>,
    ) -> Result<(), ApiError> {
        let key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .or(query_key);

        check(self.webhook_key.as_ref(), key)
    }
}
