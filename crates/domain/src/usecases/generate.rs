//! Generation use case - draft, save, then best-effort taxonomy

use crate::{
    model::{GenerationReport, Post},
    policy::{DraftPolicy, PolicyViolation},
    ports::{ContentGenerator, GenerateError, PostRepository, RepositoryError},
};

/// Errors that fail a generation
#[derive(Debug, thiserror::Error)]
pub enum GenerateUseCaseError {
    #[error("Content generation failed: {0}")]
    Generation(#[from] GenerateError),
    #[error("Generated draft rejected: {0}")]
    InvalidDraft(#[from] PolicyViolation),
    #[error("Failed to save post: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Runs one generate -> save post -> save taxonomy sequence
pub struct GenerateUseCase<'a, G: ?Sized, R: ?Sized> {
    generator: &'a G,
    repository: &'a R,
    policy: &'a DraftPolicy,
}

impl<'a, G, R> GenerateUseCase<'a, G, R>
where
    G: ContentGenerator + ?Sized,
    R: PostRepository + ?Sized,
{
    pub fn new(generator: &'a G, repository: &'a R, policy: &'a DraftPolicy) -> Self {
        Self {
            generator,
            repository,
            policy,
        }
    }

    /// Generate and persist one post.
    ///
    /// The post is saved before any tag or category is touched. Taxonomy
    /// failures after that point are logged and reported, never returned.
    pub async fn run(&self) -> Result<GenerationReport, GenerateUseCaseError> {
        let draft = self.generator.generate().await?;

        tracing::debug!(title = %draft.title, "Received draft");

        let new_post = self.policy.prepare(draft)?;
        let post = self.repository.save_post(&new_post).await?;

        tracing::info!(
            post_id = %post.id,
            slug = %post.slug,
            "Saved generated post"
        );

        Ok(self.save_taxonomy(post, &new_post.categories).await)
    }

    async fn save_taxonomy(&self, post: Post, categories: &[String]) -> GenerationReport {
        let mut taxonomy_failures = Vec::new();

        let tag_ids = if post.tags.is_empty() {
            vec![]
        } else {
            match self.repository.ensure_tags_exist(&post.tags).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(post_id = %post.id, error = %e, "Failed to ensure tags");
                    taxonomy_failures.push(format!("tags: {}", e));
                    vec![]
                }
            }
        };

        let mut category_ids = Vec::new();
        for name in categories {
            match self.repository.ensure_category_exists(name).await {
                Ok(id) => category_ids.push(id),
                Err(e) => {
                    tracing::warn!(
                        post_id = %post.id,
                        category = %name,
                        error = %e,
                        "Failed to ensure category"
                    );
                    taxonomy_failures.push(format!("category '{}': {}", name, e));
                }
            }
        }

        GenerationReport {
            post,
            tag_ids,
            category_ids,
            taxonomy_failures,
        }
    }
}
