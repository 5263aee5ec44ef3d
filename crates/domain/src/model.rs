//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Spacing between scheduled generations, in whole minutes (always > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct IntervalMinutes(NonZeroU32);

impl IntervalMinutes {
    /// Interval used when a caller does not provide one
    pub const DEFAULT: Self = Self(NonZeroU32::new(10).unwrap());

    pub fn new(minutes: u32) -> Result<Self, InvalidInterval> {
        NonZeroU32::new(minutes)
            .map(Self)
            .ok_or(InvalidInterval(i64::from(minutes)))
    }

    /// Build from an untrusted signed value (HTTP bodies, CLI input)
    pub fn from_signed(minutes: i64) -> Result<Self, InvalidInterval> {
        u32::try_from(minutes)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(InvalidInterval(minutes))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Timer period: `minutes * 60_000` ms
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.get()) * 60)
    }
}

impl Default for IntervalMinutes {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for IntervalMinutes {
    type Error = InvalidInterval;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IntervalMinutes> for u32 {
    fn from(value: IntervalMinutes) -> Self {
        value.get()
    }
}

impl fmt::Display for IntervalMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.get())
    }
}

/// Rejected interval value
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("interval must be a positive number of minutes, got {0}")]
pub struct InvalidInterval(pub i64);

/// Persisted automation state (one record per deployment)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationStatus {
    /// Whether scheduled generation is active
    pub is_running: bool,
    /// Spacing between scheduled generations
    pub interval_minutes: IntervalMinutes,
    /// Set after each successful generation
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_generated_at: Option<OffsetDateTime>,
    /// Posts created by automation; never decreases
    pub total_posts: u64,
}

impl Default for AutomationStatus {
    fn default() -> Self {
        Self {
            is_running: false,
            interval_minutes: IntervalMinutes::DEFAULT,
            last_generated_at: None,
            total_posts: 0,
        }
    }
}

impl AutomationStatus {
    pub fn run_state(&self) -> RunState {
        if self.is_running {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }

    /// Apply a patch in memory, with the same semantics stores use
    pub fn patched(mut self, patch: &StatusPatch) -> Self {
        if let Some(is_running) = patch.is_running {
            self.is_running = is_running;
        }
        if let Some(interval) = patch.interval_minutes {
            self.interval_minutes = interval;
        }
        if let Some(at) = patch.last_generated_at {
            self.last_generated_at = Some(at);
        }
        self.total_posts = self.total_posts.saturating_add(patch.posts_created);
        self
    }
}

/// The two states of the automation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Stopped,
    Running,
}

/// Partial-field update of [`AutomationStatus`]
///
/// `None` fields are left untouched. `posts_created` is added to the stored
/// counter rather than overwriting it, so concurrent writers cannot lose
/// increments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPatch {
    pub is_running: Option<bool>,
    pub interval_minutes: Option<IntervalMinutes>,
    pub last_generated_at: Option<OffsetDateTime>,
    pub posts_created: u64,
}

impl StatusPatch {
    pub fn started(interval: IntervalMinutes) -> Self {
        Self {
            is_running: Some(true),
            interval_minutes: Some(interval),
            ..Default::default()
        }
    }

    pub fn stopped() -> Self {
        Self {
            is_running: Some(false),
            ..Default::default()
        }
    }

    pub fn generated(at: OffsetDateTime) -> Self {
        Self {
            last_generated_at: Some(at),
            posts_created: 1,
            ..Default::default()
        }
    }
}

/// Draft produced by the content generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Publication state of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    #[default]
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

/// A validated draft ready to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    /// Primary category (first category of the draft)
    pub category: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub auto_generated: bool,
}

/// A persisted post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub auto_generated: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Tag taxonomy entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Category taxonomy entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Result of one successful generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub post: Post,
    /// IDs of tags ensured for the post (empty if the tag step failed)
    pub tag_ids: Vec<Uuid>,
    /// IDs of categories that were ensured successfully
    pub category_ids: Vec<Uuid>,
    /// Taxonomy steps that failed without failing the generation
    pub taxonomy_failures: Vec<String>,
}

/// Caller that asked the controller to act
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// In-process repeating timer
    Timer,
    /// Authenticated HTTP action endpoint
    Action,
    /// Third-party cron webhook
    Webhook,
    /// Operator command line
    Cli,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timer => "timer",
            Self::Action => "action",
            Self::Webhook => "webhook",
            Self::Cli => "cli",
        };
        f.write_str(name)
    }
}

/// What a trigger path ended up doing
#[derive(Debug, Clone)]
pub enum TriggerOutcome {
    /// Automation is stopped; nothing was generated
    Disabled,
    /// A post was generated
    Generated(Box<GenerationReport>),
}

/// In-process view of the controller (not persisted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeSnapshot {
    /// Whether this process currently has a timer armed
    pub timer_armed: bool,
    /// Whether a generation is in flight in this process
    pub generating: bool,
    /// Failed generations since the last success
    pub consecutive_failures: u32,
}
