//! Fake port implementations shared by the use case tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::model::{AutomationStatus, DraftPost, NewPost, Post, StatusPatch};
use crate::ports::{
    ContentGenerator, GenerateError, PostRepository, RepositoryError, StatusError, StatusStore,
};

pub fn sample_draft() -> DraftPost {
    DraftPost {
        title: "Understanding Async Rust".to_string(),
        content: "Futures are lazy state machines driven by an executor. ".repeat(8),
        excerpt: "A tour of futures and executors".to_string(),
        categories: vec!["Programming".to_string()],
        tags: vec!["rust".to_string(), "async".to_string()],
    }
}

#[derive(Default)]
pub struct FakeStatusStore {
    pub record: Mutex<Option<AutomationStatus>>,
    pub lease: Mutex<Option<(String, OffsetDateTime)>>,
    pub loads: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeStatusStore {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, is_running: bool) {
        let mut record = self.record.lock().unwrap();
        let current = record.take().unwrap_or_default();
        *record = Some(AutomationStatus {
            is_running,
            ..current
        });
    }

    fn check(&self) -> Result<(), StatusError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StatusError::Database("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StatusStore for FakeStatusStore {
    async fn load_or_default(&self) -> Result<AutomationStatus, StatusError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut record = self.record.lock().unwrap();
        Ok(record.get_or_insert_with(AutomationStatus::default).clone())
    }

    async fn apply(&self, patch: &StatusPatch) -> Result<AutomationStatus, StatusError> {
        self.check()?;
        let mut record = self.record.lock().unwrap();
        let next = record.take().unwrap_or_default().patched(patch);
        *record = Some(next.clone());
        Ok(next)
    }

    async fn try_acquire_lease(
        &self,
        holder: &str,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Result<bool, StatusError> {
        self.check()?;
        let mut lease = self.lease.lock().unwrap();
        match lease.as_ref() {
            Some((current, expires_at)) if current != holder && *expires_at > now => Ok(false),
            _ => {
                *lease = Some((holder.to_string(), now + ttl));
                Ok(true)
            }
        }
    }

    async fn release_lease(&self, holder: &str) -> Result<(), StatusError> {
        self.check()?;
        let mut lease = self.lease.lock().unwrap();
        if lease.as_ref().is_some_and(|(current, _)| current == holder) {
            *lease = None;
        }
        Ok(())
    }
}

/// Pauses a fake call until released, so tests can overlap calls
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

pub struct FakeGenerator {
    pub draft: DraftPost,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub gate: Option<Arc<Gate>>,
    pub yield_once: bool,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self {
            draft: sample_draft(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            gate: None,
            yield_once: false,
        }
    }

    pub fn failing() -> Self {
        let generator = Self::new();
        generator.fail.store(true, Ordering::SeqCst);
        generator
    }

    pub fn gated() -> (Self, Arc<Gate>) {
        let gate = Gate::new();
        let generator = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::new()
        };
        (generator, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(&self) -> Result<DraftPost, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.yield_once {
            tokio::task::yield_now().await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerateError::Api("upstream unavailable".to_string()));
        }
        Ok(self.draft.clone())
    }
}

#[derive(Default)]
pub struct FakeRepository {
    pub saved: Mutex<Vec<Post>>,
    pub fail_save: bool,
    pub fail_tags: bool,
    pub fail_category: bool,
    pub tag_calls: AtomicUsize,
    pub category_calls: AtomicUsize,
    pub tag_gate: Option<Arc<Gate>>,
}

impl FakeRepository {
    /// Saves posts normally but parks in `ensure_tags_exist`
    pub fn gated_tags() -> (Self, Arc<Gate>) {
        let gate = Gate::new();
        let repository = Self {
            tag_gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (repository, gate)
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn taxonomy_calls(&self) -> usize {
        self.tag_calls.load(Ordering::SeqCst) + self.category_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostRepository for FakeRepository {
    async fn save_post(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        if self.fail_save {
            return Err(RepositoryError::Database("disk full".to_string()));
        }
        let saved = Post {
            id: Uuid::new_v4(),
            slug: post.slug.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone(),
            category: post.category.clone(),
            tags: post.tags.clone(),
            status: post.status,
            auto_generated: post.auto_generated,
            created_at: OffsetDateTime::now_utc(),
        };
        self.saved.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    async fn ensure_tags_exist(&self, names: &[String]) -> Result<Vec<Uuid>, RepositoryError> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.tag_gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.fail_tags {
            return Err(RepositoryError::Database("tags table locked".to_string()));
        }
        Ok(names.iter().map(|_| Uuid::new_v4()).collect())
    }

    async fn ensure_category_exists(&self, _name: &str) -> Result<Uuid, RepositoryError> {
        self.category_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_category {
            return Err(RepositoryError::Database("categories table locked".to_string()));
        }
        Ok(Uuid::new_v4())
    }
}
