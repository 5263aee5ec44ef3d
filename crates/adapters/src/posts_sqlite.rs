//! SQLite post repository implementation

use async_trait::async_trait;
use autopost_domain::policy::slugify;
use autopost_domain::{NewPost, Post, PostRepository, RepositoryError};
use sqlx::{Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::sqlite::format_timestamp;

/// SQLite-backed posts, tags, and categories
#[derive(Debug, Clone)]
pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of stored posts
    pub async fn count_posts(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        u64::try_from(count).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Find-or-create a row in `tags` or `categories` keyed by slug
async fn find_or_create(
    tx: &mut Transaction<'_, Sqlite>,
    table: &'static str,
    name: &str,
    created_at: &str,
) -> Result<Uuid, RepositoryError> {
    let slug = slugify(name);

    let insert = format!(
        "INSERT INTO {table} (id, name, slug, created_at) VALUES (?, ?, ?, ?) \
         ON CONFLICT(slug) DO NOTHING"
    );
    sqlx::query(&insert)
        .bind(Uuid::new_v4().to_string())
        .bind(name.trim())
        .bind(&slug)
        .bind(created_at)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;

    let select = format!("SELECT id FROM {table} WHERE slug = ?");
    let (id,): (String,) = sqlx::query_as(&select)
        .bind(&slug)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error)?;

    Uuid::parse_str(&id).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn save_post(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let id = Uuid::new_v4();
        let created_at = OffsetDateTime::now_utc();
        let created_at_str =
            format_timestamp(created_at).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let tags = serde_json::to_string(&post.tags)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO posts
                (id, slug, title, content, excerpt, category, tags, status, auto_generated, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.category)
        .bind(tags)
        .bind(post.status.as_str())
        .bind(post.auto_generated)
        .bind(created_at_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!("slug '{}' already exists", post.slug))
            } else {
                db_error(e)
            }
        })?;

        Ok(Post {
            id,
            slug: post.slug.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone(),
            category: post.category.clone(),
            tags: post.tags.clone(),
            status: post.status,
            auto_generated: post.auto_generated,
            created_at,
        })
    }

    async fn ensure_tags_exist(&self, names: &[String]) -> Result<Vec<Uuid>, RepositoryError> {
        let created_at = format_timestamp(OffsetDateTime::now_utc())
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(find_or_create(&mut tx, "tags", name, &created_at).await?);
        }
        tx.commit().await.map_err(db_error)?;

        Ok(ids)
    }

    async fn ensure_category_exists(&self, name: &str) -> Result<Uuid, RepositoryError> {
        let created_at = format_timestamp(OffsetDateTime::now_utc())
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let id = find_or_create(&mut tx, "categories", name, &created_at).await?;
        tx.commit().await.map_err(db_error)?;

        Ok(id)
    }
}
