//! Stub generator for testing and offline mode

use async_trait::async_trait;
use autopost_domain::{ContentGenerator, DraftPost, GenerateError};
use std::sync::atomic::{AtomicU64, Ordering};

enum Mode {
    Fixed(DraftPost),
    Error(GenerateError),
    Numbered,
}

/// Stub generator that returns configurable drafts
pub struct StubGenerator {
    mode: Mode,
    counter: AtomicU64,
}

impl StubGenerator {
    /// Create a stub that returns a fresh, numbered draft on every call
    pub fn numbered() -> Self {
        Self {
            mode: Mode::Numbered,
            counter: AtomicU64::new(0),
        }
    }

    /// Create a stub that always returns `draft`
    pub fn with_draft(draft: DraftPost) -> Self {
        Self {
            mode: Mode::Fixed(draft),
            counter: AtomicU64::new(0),
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: GenerateError) -> Self {
        Self {
            mode: Mode::Error(error),
            counter: AtomicU64::new(0),
        }
    }

    /// Number of `generate` calls so far
    pub fn calls(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::numbered()
    }
}

fn numbered_draft(n: u64) -> DraftPost {
    DraftPost {
        title: format!("Offline draft #{}", n),
        content: format!(
            "This post was produced by the offline stub generator (run {}). ",
            n
        )
        .repeat(5),
        excerpt: String::new(),
        categories: vec!["General".to_string()],
        tags: vec!["stub".to_string(), "offline".to_string()],
    }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn generate(&self) -> Result<DraftPost, GenerateError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;

        match &self.mode {
            Mode::Fixed(draft) => Ok(draft.clone()),
            Mode::Numbered => Ok(numbered_draft(n)),
            Mode::Error(error) => Err(match error {
                GenerateError::Api(msg) => GenerateError::Api(msg.clone()),
                GenerateError::InvalidFormat(msg) => GenerateError::InvalidFormat(msg.clone()),
                GenerateError::RateLimited => GenerateError::RateLimited,
                GenerateError::Timeout => GenerateError::Timeout,
                GenerateError::Config(msg) => GenerateError::Config(msg.clone()),
            }),
        }
    }
}
