//! Validation and normalization of generated drafts

use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::model::{DraftPost, NewPost, PostStatus};

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

const MAX_SLUG_LEN: usize = 80;

/// Draft policy configuration
#[derive(Debug, Clone)]
pub struct DraftPolicyConfig {
    /// Minimum content length in characters
    pub min_content_chars: usize,
    /// Length of an excerpt derived from content
    pub excerpt_chars: usize,
    /// Maximum tags kept per post
    pub max_tags: usize,
    /// Maximum categories kept per post
    pub max_categories: usize,
    /// Case-insensitive substrings that reject a draft
    pub forbidden_patterns: Vec<String>,
}

impl Default for DraftPolicyConfig {
    fn default() -> Self {
        Self {
            min_content_chars: 200,
            excerpt_chars: 160,
            max_tags: 8,
            max_categories: 3,
            forbidden_patterns: vec![],
        }
    }
}

/// Validates a generator draft and turns it into a [`NewPost`]
#[derive(Debug, Clone)]
pub struct DraftPolicy {
    config: DraftPolicyConfig,
}

impl DraftPolicy {
    pub fn new(config: DraftPolicyConfig) -> Self {
        Self { config }
    }

    pub fn prepare(&self, draft: DraftPost) -> Result<NewPost, PolicyViolation> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(PolicyViolation::EmptyTitle);
        }

        let content = draft.content.trim().to_string();
        let content_chars = content.chars().count();
        if content_chars < self.config.min_content_chars {
            return Err(PolicyViolation::ContentTooShort {
                len: content_chars,
                min: self.config.min_content_chars,
            });
        }

        for pattern in &self.config.forbidden_patterns {
            let needle = pattern.to_lowercase();
            if needle.is_empty() {
                continue;
            }
            for (field, text) in [("title", &title), ("content", &content)] {
                if text.to_lowercase().contains(&needle) {
                    return Err(PolicyViolation::ForbiddenPattern {
                        pattern: pattern.clone(),
                        field,
                    });
                }
            }
        }

        let excerpt = match draft.excerpt.trim() {
            "" => truncate_chars(&content, self.config.excerpt_chars),
            given => given.to_string(),
        };

        let categories = normalize_names(draft.categories, self.config.max_categories);
        let tags = normalize_names(draft.tags, self.config.max_tags);

        Ok(NewPost {
            slug: unique_slug(&title),
            category: categories.first().cloned(),
            title,
            content,
            excerpt,
            categories,
            tags,
            status: PostStatus::Published,
            auto_generated: true,
        })
    }
}

impl Default for DraftPolicy {
    fn default() -> Self {
        Self::new(DraftPolicyConfig::default())
    }
}

/// Reasons a draft is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("Draft has an empty title")]
    EmptyTitle,
    #[error("Draft content too short: {len} < {min} chars")]
    ContentTooShort { len: usize, min: usize },
    #[error("Forbidden pattern '{pattern}' found in {field}")]
    ForbiddenPattern {
        pattern: String,
        field: &'static str,
    },
}

/// URL-safe slug: lowercase ASCII alphanumerics joined by `-`
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let joined = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let trimmed = joined.trim_matches('-');

    let mut slug: String = trimmed.chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

/// Slug with a short random suffix so repeated titles never collide
fn unique_slug(title: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", slugify(title), &suffix[..8])
}

/// Trim, drop empties, dedupe case-insensitively (first spelling wins), cap
fn normalize_names(names: Vec<String>, max: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();

    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
        if out.len() == max {
            break;
        }
    }

    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> DraftPost {
        DraftPost {
            title: "  Rust Ownership, Explained  ".to_string(),
            content: "Ownership ".repeat(40),
            excerpt: String::new(),
            categories: vec!["Programming".to_string(), "programming".to_string()],
            tags: vec![
                "rust".to_string(),
                " ".to_string(),
                "Memory".to_string(),
                "RUST".to_string(),
            ],
        }
    }

    #[test]
    fn test_prepare_normalizes_draft() {
        let post = DraftPolicy::default().prepare(sample_draft()).unwrap();

        assert_eq!(post.title, "Rust Ownership, Explained");
        assert!(post.slug.starts_with("rust-ownership-explained-"));
        assert_eq!(post.tags, vec!["rust".to_string(), "Memory".to_string()]);
        assert_eq!(post.categories, vec!["Programming".to_string()]);
        assert_eq!(post.category.as_deref(), Some("Programming"));
        assert!(post.auto_generated);
        assert_eq!(post.status, PostStatus::Published);
    }

    #[test]
    fn test_prepare_derives_excerpt() {
        let post = DraftPolicy::default().prepare(sample_draft()).unwrap();
        assert!(post.excerpt.ends_with("..."));
        assert!(post.excerpt.chars().count() <= 160);
    }

    #[test]
    fn test_prepare_keeps_given_excerpt() {
        let mut draft = sample_draft();
        draft.excerpt = "Short and sweet".to_string();
        let post = DraftPolicy::default().prepare(draft).unwrap();
        assert_eq!(post.excerpt, "Short and sweet");
    }

    #[test]
    fn test_prepare_rejects_empty_title() {
        let mut draft = sample_draft();
        draft.title = "   ".to_string();
        assert_eq!(
            DraftPolicy::default().prepare(draft),
            Err(PolicyViolation::EmptyTitle)
        );
    }

    #[test]
    fn test_prepare_rejects_short_content() {
        let mut draft = sample_draft();
        draft.content = "too short".to_string();
        assert!(matches!(
            DraftPolicy::default().prepare(draft),
            Err(PolicyViolation::ContentTooShort { len: 9, min: 200 })
        ));
    }

    #[test]
    fn test_prepare_rejects_forbidden_pattern() {
        let policy = DraftPolicy::new(DraftPolicyConfig {
            forbidden_patterns: vec!["OWNERSHIP".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            policy.prepare(sample_draft()),
            Err(PolicyViolation::ForbiddenPattern { field: "title", .. })
        ));
    }

    #[test]
    fn test_prepare_caps_tags() {
        let policy = DraftPolicy::new(DraftPolicyConfig {
            max_tags: 1,
            ..Default::default()
        });
        let post = policy.prepare(sample_draft()).unwrap();
        assert_eq!(post.tags, vec!["rust".to_string()]);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  --Async  Rust 2024-- "), "async-rust-2024");
        assert_eq!(slugify("???"), "post");
        assert!(slugify(&"a".repeat(200)).len() <= 80);
    }
}
