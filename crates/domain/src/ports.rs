//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{AutomationStatus, DraftPost, NewPost, Post, StatusPatch};

/// Error type for status store operations
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for the persisted automation status record
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Read the status record, creating the default one if absent
    async fn load_or_default(&self) -> Result<AutomationStatus, StatusError>;

    /// Upsert the fields set in `patch`, returning the resulting record
    async fn apply(&self, patch: &StatusPatch) -> Result<AutomationStatus, StatusError>;

    /// Try to take the generation lease for `ttl`.
    ///
    /// Succeeds when the lease is free, expired, or already held by `holder`.
    async fn try_acquire_lease(
        &self,
        holder: &str,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Result<bool, StatusError>;

    /// Release the lease if `holder` owns it
    async fn release_lease(&self, holder: &str) -> Result<(), StatusError>;
}

/// Error type for content generation
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for producing a draft post
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce one draft; failures carry no partial result
    async fn generate(&self) -> Result<DraftPost, GenerateError>;
}

/// Error type for post repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting posts and their taxonomy
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Durably save a post
    async fn save_post(&self, post: &NewPost) -> Result<Post, RepositoryError>;

    /// Find or create tags by name, returning their IDs in input order
    async fn ensure_tags_exist(&self, names: &[String]) -> Result<Vec<Uuid>, RepositoryError>;

    /// Find or create a category by name
    async fn ensure_category_exists(&self, name: &str) -> Result<Uuid, RepositoryError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
