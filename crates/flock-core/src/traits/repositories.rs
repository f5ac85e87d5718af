//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs; the infrastructure layer provides
//! the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Broadcast, DeliveryAttempt, Member, Reaction, ReactionCount, ReactionKey};
use crate::error::DomainError;
use crate::value_objects::MessageId;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Directory
// ============================================================================

/// The member roster, consumed read-only by the engine
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// All active members, optionally excluding one address
    async fn active_recipients(&self, exclude: Option<&str>) -> RepoResult<Vec<Member>>;

    /// Resolve a sender's display identity; None for unregistered addresses
    async fn identity(&self, address: &str) -> RepoResult<Option<Member>>;

    /// Count of active members (STATS)
    async fn member_count(&self) -> RepoResult<i64>;
}

// ============================================================================
// Broadcast ledger
// ============================================================================

#[async_trait]
pub trait BroadcastRepository: Send + Sync {
    /// Append a new broadcast (broadcasts are never deleted)
    async fn save(&self, broadcast: &Broadcast) -> RepoResult<()>;

    /// Find broadcast by id
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Broadcast>>;

    /// Most recent broadcasts within a window, newest first, optionally
    /// excluding one sender's own messages
    async fn recent(
        &self,
        since: DateTime<Utc>,
        exclude_sender: Option<&str>,
        limit: i64,
    ) -> RepoResult<Vec<Broadcast>>;

    /// Latest broadcasts regardless of sender, newest first (RECENT command)
    async fn latest(&self, limit: i64) -> RepoResult<Vec<Broadcast>>;

    /// Number of broadcasts accepted since the given instant (STATS)
    async fn count_since(&self, since: DateTime<Utc>) -> RepoResult<i64>;

    /// Persist the recomputed reaction summary onto the broadcast row
    async fn update_summary(
        &self,
        id: MessageId,
        summary: Option<&str>,
        at: DateTime<Utc>,
    ) -> RepoResult<()>;
}

// ============================================================================
// Reaction store
// ============================================================================

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Find the single reaction row for (broadcast, reactor)
    async fn find(
        &self,
        broadcast_id: MessageId,
        reactor_address: &str,
    ) -> RepoResult<Option<Reaction>>;

    /// Insert or update the row keyed by (broadcast_id, reactor_address)
    async fn upsert(&self, reaction: &Reaction) -> RepoResult<()>;

    /// Active reaction counts on a broadcast, grouped by emoji
    async fn active_counts(&self, broadcast_id: MessageId) -> RepoResult<Vec<ReactionCount>>;

    /// Active, not-yet-digested reactions created since the given instant
    async fn unprocessed_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<Reaction>>;

    /// Mark reactions as included in a digest; idempotent and monotonic
    async fn mark_processed(&self, keys: &[ReactionKey]) -> RepoResult<()>;
}

// ============================================================================
// Delivery log
// ============================================================================

#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// Record the settled outcome of a fan-out batch, one row per recipient
    async fn record(&self, attempts: &[DeliveryAttempt]) -> RepoResult<()>;
}
