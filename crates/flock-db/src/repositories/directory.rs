//! PostgreSQL implementation of DirectoryRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use flock_core::entities::Member;
use flock_core::traits::{DirectoryRepository, RepoResult};

use crate::models::MemberModel;

use super::error::map_db_error;

/// PostgreSQL implementation of DirectoryRepository
#[derive(Clone)]
pub struct PgDirectoryRepository {
    pool: PgPool,
}

impl PgDirectoryRepository {
    /// Create a new PgDirectoryRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryRepository for PgDirectoryRepository {
    #[instrument(skip(self))]
    async fn active_recipients(&self, exclude: Option<&str>) -> RepoResult<Vec<Member>> {
        let results = sqlx::query_as::<_, MemberModel>(
            r#"
            SELECT address, name, is_admin, active, created_at
            FROM members
            WHERE active
              AND ($1::text IS NULL OR address <> $1)
            ORDER BY name
            "#,
        )
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Member::from).collect())
    }

    #[instrument(skip(self))]
    async fn identity(&self, address: &str) -> RepoResult<Option<Member>> {
        let result = sqlx::query_as::<_, MemberModel>(
            r#"
            SELECT address, name, is_admin, active, created_at
            FROM members
            WHERE address = $1 AND active
            "#,
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Member::from))
    }

    #[instrument(skip(self))]
    async fn member_count(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM members WHERE active
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(count)
    }
}
