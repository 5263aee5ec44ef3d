//! SQLite status store implementation

use async_trait::async_trait;
use autopost_domain::{AutomationStatus, IntervalMinutes, StatusError, StatusPatch, StatusStore};
use sqlx::SqlitePool;
use std::time::Duration;
use time::OffsetDateTime;

use crate::sqlite::{format_timestamp, parse_timestamp};

type StatusRow = (bool, i64, Option<String>, i64);

/// SQLite-backed automation status (single row, `id = 1`)
#[derive(Debug, Clone)]
pub struct SqliteStatusStore {
    pool: SqlitePool,
}

impl SqliteStatusStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn now_string() -> Result<String, StatusError> {
    format_timestamp(OffsetDateTime::now_utc())
        .map_err(|e| StatusError::Serialization(e.to_string()))
}

fn status_from_row(row: StatusRow) -> Result<AutomationStatus, StatusError> {
    let (is_running, interval_minutes, last_generated_at, total_posts) = row;

    let interval_minutes = IntervalMinutes::from_signed(interval_minutes)
        .map_err(|e| StatusError::Serialization(e.to_string()))?;

    let last_generated_at = last_generated_at
        .as_deref()
        .map(parse_timestamp)
        .transpose()
        .map_err(|e| StatusError::Serialization(e.to_string()))?;

    let total_posts =
        u64::try_from(total_posts).map_err(|e| StatusError::Serialization(e.to_string()))?;

    Ok(AutomationStatus {
        is_running,
        interval_minutes,
        last_generated_at,
        total_posts,
    })
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn load_or_default(&self) -> Result<AutomationStatus, StatusError> {
        let defaults = AutomationStatus::default();

        sqlx::query(
            r#"
            INSERT INTO automation_status (id, is_running, interval_minutes, total_posts, updated_at)
            VALUES (1, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(defaults.is_running)
        .bind(i64::from(defaults.interval_minutes.get()))
        .bind(0_i64)
        .bind(now_string()?)
        .execute(&self.pool)
        .await
        .map_err(|e| StatusError::Database(e.to_string()))?;

        let row: StatusRow = sqlx::query_as(
            r#"
            SELECT is_running, interval_minutes, last_generated_at, total_posts
            FROM automation_status
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StatusError::Database(e.to_string()))?;

        status_from_row(row)
    }

    async fn apply(&self, patch: &StatusPatch) -> Result<AutomationStatus, StatusError> {
        let defaults = AutomationStatus::default();

        let last_generated_at = patch
            .last_generated_at
            .map(format_timestamp)
            .transpose()
            .map_err(|e| StatusError::Serialization(e.to_string()))?;

        let posts_created = i64::try_from(patch.posts_created)
            .map_err(|e| StatusError::Serialization(e.to_string()))?;

        let row: StatusRow = sqlx::query_as(
            r#"
            INSERT INTO automation_status
                (id, is_running, interval_minutes, last_generated_at, total_posts, updated_at)
            VALUES (1, COALESCE(?1, ?2), COALESCE(?3, ?4), ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                is_running = COALESCE(?1, automation_status.is_running),
                interval_minutes = COALESCE(?3, automation_status.interval_minutes),
                last_generated_at = COALESCE(?5, automation_status.last_generated_at),
                total_posts = automation_status.total_posts + ?6,
                updated_at = ?7
            RETURNING is_running, interval_minutes, last_generated_at, total_posts
            "#,
        )
        .bind(patch.is_running)
        .bind(defaults.is_running)
        .bind(patch.interval_minutes.map(|i| i64::from(i.get())))
        .bind(i64::from(defaults.interval_minutes.get()))
        .bind(last_generated_at)
        .bind(posts_created)
        .bind(now_string()?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StatusError::Database(e.to_string()))?;

        status_from_row(row)
    }

    async fn try_acquire_lease(
        &self,
        holder: &str,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Result<bool, StatusError> {
        let expires_at = (now + ttl).unix_timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO automation_lease (id, holder, expires_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                holder = excluded.holder,
                expires_at = excluded.expires_at
            WHERE automation_lease.holder = excluded.holder
               OR automation_lease.expires_at <= ?3
            "#,
        )
        .bind(holder)
        .bind(expires_at)
        .bind(now.unix_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| StatusError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn release_lease(&self, holder: &str) -> Result<(), StatusError> {
        sqlx::query("DELETE FROM automation_lease WHERE id = 1 AND holder = ?")
            .bind(holder)
            .execute(&self.pool)
            .await
            .map_err(|e| StatusError::Database(e.to_string()))?;

        Ok(())
    }
}
