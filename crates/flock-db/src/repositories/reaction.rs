//! PostgreSQL implementation of ReactionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use flock_core::entities::{Reaction, ReactionCount, ReactionKey};
use flock_core::traits::{ReactionRepository, RepoResult};
use flock_core::value_objects::MessageId;

use crate::models::{ReactionCountModel, ReactionModel};

use super::error::map_db_error;

/// PostgreSQL implementation of ReactionRepository
#[derive(Clone)]
pub struct PgReactionRepository {
    pool: PgPool,
}

impl PgReactionRepository {
    /// Create a new PgReactionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReactionRepository for PgReactionRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        broadcast_id: MessageId,
        reactor_address: &str,
    ) -> RepoResult<Option<Reaction>> {
        let result = sqlx::query_as::<_, ReactionModel>(
            r#"
            SELECT broadcast_id, reactor_address, reactor_name, emoji, previous_emoji,
                   is_active, processed, created_at, updated_at
            FROM reactions
            WHERE broadcast_id = $1 AND reactor_address = $2
            "#,
        )
        .bind(broadcast_id.into_inner())
        .bind(reactor_address)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Reaction::from))
    }

    #[instrument(skip(self, reaction), fields(broadcast_id = %reaction.broadcast_id, reactor = %reaction.reactor_address))]
    async fn upsert(&self, reaction: &Reaction) -> RepoResult<()> {
        // The primary key on (broadcast_id, reactor_address) enforces the
        // single-row-per-reactor invariant; `processed` stays monotonic.
        sqlx::query(
            r#"
            INSERT INTO reactions (broadcast_id, reactor_address, reactor_name, emoji,
                                   previous_emoji, is_active, processed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (broadcast_id, reactor_address) DO UPDATE
            SET reactor_name = EXCLUDED.reactor_name,
                emoji = EXCLUDED.emoji,
                previous_emoji = EXCLUDED.previous_emoji,
                is_active = EXCLUDED.is_active,
                processed = reactions.processed OR EXCLUDED.processed,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(reaction.broadcast_id.into_inner())
        .bind(&reaction.reactor_address)
        .bind(&reaction.reactor_name)
        .bind(&reaction.emoji)
        .bind(reaction.previous_emoji.as_deref())
        .bind(reaction.is_active)
        .bind(reaction.processed)
        .bind(reaction.created_at)
        .bind(reaction.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn active_counts(&self, broadcast_id: MessageId) -> RepoResult<Vec<ReactionCount>> {
        let results = sqlx::query_as::<_, ReactionCountModel>(
            r#"
            SELECT emoji, COUNT(*) as count
            FROM reactions
            WHERE broadcast_id = $1 AND is_active
            GROUP BY emoji
            ORDER BY count DESC, emoji
            "#,
        )
        .bind(broadcast_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(ReactionCount::from).collect())
    }

    #[instrument(skip(self))]
    async fn unprocessed_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<Reaction>> {
        let results = sqlx::query_as::<_, ReactionModel>(
            r#"
            SELECT broadcast_id, reactor_address, reactor_name, emoji, previous_emoji,
                   is_active, processed, created_at, updated_at
            FROM reactions
            WHERE is_active AND NOT processed AND created_at >= $1
            ORDER BY created_at
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Reaction::from).collect())
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn mark_processed(&self, keys: &[ReactionKey]) -> RepoResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for key in keys {
            sqlx::query(
                r#"
                UPDATE reactions SET processed = TRUE
                WHERE broadcast_id = $1 AND reactor_address = $2
                "#,
            )
            .bind(key.broadcast_id.into_inner())
            .bind(&key.reactor_address)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }
}
