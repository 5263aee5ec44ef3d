//! In-memory post repository for testing and offline mode

use async_trait::async_trait;
use autopost_domain::policy::slugify;
use autopost_domain::{Category, NewPost, Post, PostRepository, RepositoryError, Tag};
use std::collections::HashMap;
use std::sync::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

/// In-memory post repository implementation
#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<Vec<Post>>,
    tags: RwLock<HashMap<String, Tag>>,
    categories: RwLock<HashMap<String, Category>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all saved posts, oldest first
    pub fn posts(&self) -> Vec<Post> {
        self.posts.read().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags
            .read()
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories
            .read()
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn save_post(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let mut posts = self
            .posts
            .write()
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if posts.iter().any(|p| p.slug == post.slug) {
            return Err(RepositoryError::Conflict(format!(
                "slug '{}' already exists",
                post.slug
            )));
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
        posts.push(saved.clone());
        Ok(saved)
    }

    async fn ensure_tags_exist(&self, names: &[String]) -> Result<Vec<Uuid>, RepositoryError> {
        let mut tags = self
            .tags
            .write()
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(names
            .iter()
            .map(|name| {
                let slug = slugify(name);
                tags.entry(slug.clone())
                    .or_insert_with(|| Tag {
                        id: Uuid::new_v4(),
                        name: name.trim().to_string(),
                        slug,
                    })
                    .id
            })
            .collect())
    }

    async fn ensure_category_exists(&self, name: &str) -> Result<Uuid, RepositoryError> {
        let mut categories = self
            .categories
            .write()
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let slug = slugify(name);
        let category = categories.entry(slug.clone()).or_insert_with(|| Category {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            slug,
        });
        Ok(category.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopost_domain::PostStatus;

    fn new_post(slug: &str) -> NewPost {
        NewPost {
            slug: slug.to_string(),
            title: "Ownership explained".to_string(),
            content: "Every value has a single owner.".to_string(),
            excerpt: "Every value has...".to_string(),
            category: None,
            categories: vec![],
            tags: vec![],
            status: PostStatus::Draft,
            auto_generated: true,
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let repo = InMemoryPostRepository::new();

        repo.save_post(&new_post("ownership")).await.unwrap();
        let err = repo.save_post(&new_post("ownership")).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_taxonomy_find_or_create() {
        let repo = InMemoryPostRepository::new();

        let ids = repo
            .ensure_tags_exist(&["Rust".to_string(), "rust".to_string()])
            .await
            .unwrap();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(repo.tags().len(), 1);

        let a = repo.ensure_category_exists("Systems").await.unwrap();
        let b = repo.ensure_category_exists("systems ").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(repo.categories()[0].name, "Systems");
    }
}
