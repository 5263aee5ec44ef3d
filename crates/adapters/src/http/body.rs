//! camelCase JSON views of domain types

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use autopost_domain::{AutomationStatus, GenerationReport, Post, RuntimeSnapshot};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    is_running: bool,
    interval_minutes: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    last_generated_at: Option<OffsetDateTime>,
    total_posts: u64,
}

impl From<AutomationStatus> for StatusBody {
    fn from(status: AutomationStatus) -> Self {
        Self {
            is_running: status.is_running,
            interval_minutes: status.interval_minutes.get(),
            last_generated_at: status.last_generated_at,
            total_posts: status.total_posts,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeBody {
    timer_armed: bool,
    generating: bool,
    consecutive_failures: u32,
}

impl From<RuntimeSnapshot> for RuntimeBody {
    fn from(runtime: RuntimeSnapshot) -> Self {
        Self {
            timer_armed: runtime.timer_armed,
            generating: runtime.generating,
            consecutive_failures: runtime.consecutive_failures,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    id: Uuid,
    slug: String,
    title: String,
    excerpt: String,
    category: Option<String>,
    tags: Vec<String>,
    status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl From<Post> for PostBody {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            category: post.category,
            tags: post.tags,
            status: post.status.as_str(),
            created_at: post.created_at,
        }
    }
}

/// Outcome of a trigger that may have generated a post
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationBody {
    generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<PostBody>,
    taxonomy_failures: Vec<String>,
}

impl GenerationBody {
    pub fn skipped() -> Self {
        Self {
            generated: false,
            post: None,
            taxonomy_failures: vec![],
        }
    }
}

impl From<GenerationReport> for GenerationBody {
    fn from(report: GenerationReport) -> Self {
        Self {
            generated: true,
            post: Some(report.post.into()),
            taxonomy_failures: report.taxonomy_failures,
        }
    }
}
