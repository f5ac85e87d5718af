//! PostgreSQL implementation of BroadcastRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use flock_core::entities::Broadcast;
use flock_core::traits::{BroadcastRepository, RepoResult};
use flock_core::value_objects::MessageId;

use crate::models::BroadcastModel;

use super::error::map_db_error;

/// PostgreSQL implementation of BroadcastRepository
#[derive(Clone)]
pub struct PgBroadcastRepository {
    pool: PgPool,
}

impl PgBroadcastRepository {
    /// Create a new PgBroadcastRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BroadcastRepository for PgBroadcastRepository {
    #[instrument(skip(self, broadcast), fields(id = %broadcast.id))]
    async fn save(&self, broadcast: &Broadcast) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO broadcasts (id, sender_address, sender_name, body, reaction_summary, last_reaction_update, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(broadcast.id.into_inner())
        .bind(&broadcast.sender_address)
        .bind(&broadcast.sender_name)
        .bind(&broadcast.text)
        .bind(broadcast.reaction_summary.as_deref())
        .bind(broadcast.last_reaction_update)
        .bind(broadcast.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Broadcast>> {
        let result = sqlx::query_as::<_, BroadcastModel>(
            r#"
            SELECT id, sender_address, sender_name, body, reaction_summary, last_reaction_update, created_at
            FROM broadcasts
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Broadcast::from))
    }

    #[instrument(skip(self))]
    async fn recent(
        &self,
        since: DateTime<Utc>,
        exclude_sender: Option<&str>,
        limit: i64,
    ) -> RepoResult<Vec<Broadcast>> {
        let limit = limit.clamp(1, 100);

        let results = sqlx::query_as::<_, BroadcastModel>(
            r#"
            SELECT id, sender_address, sender_name, body, reaction_summary, last_reaction_update, created_at
            FROM broadcasts
            WHERE created_at >= $1
              AND ($2::text IS NULL OR sender_address <> $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(since)
        .bind(exclude_sender)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Broadcast::from).collect())
    }

    #[instrument(skip(self))]
    async fn latest(&self, limit: i64) -> RepoResult<Vec<Broadcast>> {
        let limit = limit.clamp(1, 100);

        let results = sqlx::query_as::<_, BroadcastModel>(
            r#"
            SELECT id, sender_address, sender_name, body, reaction_summary, last_reaction_update, created_at
            FROM broadcasts
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Broadcast::from).collect())
    }

    #[instrument(skip(self))]
    async fn count_since(&self, since: DateTime<Utc>) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM broadcasts WHERE created_at >= $1
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(count)
    }

    #[instrument(skip(self, summary))]
    async fn update_summary(
        &self,
        id: MessageId,
        summary: Option<&str>,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE broadcasts
            SET reaction_summary = $2, last_reaction_update = $3
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .bind(summary)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}
