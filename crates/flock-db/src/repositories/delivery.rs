//! PostgreSQL implementation of DeliveryRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use flock_core::entities::DeliveryAttempt;
use flock_core::traits::{DeliveryRepository, RepoResult};

use super::error::map_db_error;

/// PostgreSQL implementation of DeliveryRepository
#[derive(Clone)]
pub struct PgDeliveryRepository {
    pool: PgPool,
}

impl PgDeliveryRepository {
    /// Create a new PgDeliveryRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryRepository for PgDeliveryRepository {
    #[instrument(skip(self, attempts), fields(count = attempts.len()))]
    async fn record(&self, attempts: &[DeliveryAttempt]) -> RepoResult<()> {
        if attempts.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        for attempt in attempts {
            sqlx::query(
                r#"
                INSERT INTO delivery_attempts
                    (message_id, recipient_address, status, provider_id, error, duration_ms, retry_count, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(attempt.message_id.into_inner())
            .bind(&attempt.recipient_address)
            .bind(attempt.status.as_str())
            .bind(attempt.provider_id.as_deref())
            .bind(attempt.error.as_deref())
            .bind(attempt.duration_ms)
            .bind(attempt.retry_count)
            .bind(attempt.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }
}
