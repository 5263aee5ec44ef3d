//! In-memory status store for testing and offline mode

use async_trait::async_trait;
use autopost_domain::{AutomationStatus, StatusError, StatusPatch, StatusStore};
use std::sync::RwLock;
use std::time::Duration;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
struct Lease {
    holder: String,
    expires_at: OffsetDateTime,
}

/// In-memory status store implementation
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    status: RwLock<Option<AutomationStatus>>,
    lease: RwLock<Option<Lease>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing record
    pub fn with_status(status: AutomationStatus) -> Self {
        Self {
            status: RwLock::new(Some(status)),
            lease: RwLock::new(None),
        }
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn load_or_default(&self) -> Result<AutomationStatus, StatusError> {
        let mut status = self
            .status
            .write()
            .map_err(|e| StatusError::Database(e.to_string()))?;
        Ok(status.get_or_insert_with(AutomationStatus::default).clone())
    }

    async fn apply(&self, patch: &StatusPatch) -> Result<AutomationStatus, StatusError> {
        let mut status = self
            .status
            .write()
            .map_err(|e| StatusError::Database(e.to_string()))?;
        let next = status.take().unwrap_or_default().patched(patch);
        *status = Some(next.clone());
        Ok(next)
    }

    async fn try_acquire_lease(
        &self,
        holder: &str,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Result<bool, StatusError> {
        let mut lease = self
            .lease
            .write()
            .map_err(|e| StatusError::Database(e.to_string()))?;

        let taken = lease
            .as_ref()
            .is_some_and(|l| l.holder != holder && l.expires_at > now);
        if taken {
            return Ok(false);
        }

        *lease = Some(Lease {
            holder: holder.to_string(),
            expires_at: now + ttl,
        });
        Ok(true)
    }

    async fn release_lease(&self, holder: &str) -> Result<(), StatusError> {
        let mut lease = self
            .lease
            .write()
            .map_err(|e| StatusError::Database(e.to_string()))?;
        if lease.as_ref().is_some_and(|l| l.holder == holder) {
            *lease = None;
        }
        Ok(())
    }
}
