//! Engine operation results

use std::time::Duration;

use flock_core::entities::ReactionAction;
use flock_core::value_objects::MessageId;

/// Settled outcome of one fan-out batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Broadcast id, or the synthetic id used for digests and updates
    pub message_id: MessageId,
    pub sent: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl BroadcastOutcome {
    /// Total recipients the batch attempted
    pub fn total(&self) -> usize {
        self.sent + self.failed
    }
}

/// Result of applying one reaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionOutcome {
    pub broadcast_id: MessageId,
    pub action: ReactionAction,
    pub emoji: String,
    /// Active reactions on the broadcast after this mutation
    pub total_active: i64,
    /// Recomputed summary; None when no active reactions remain
    pub summary: Option<String>,
    /// Timing policy decision: re-broadcast the summary now
    pub notify: bool,
}

/// Raw inbound attachment media, not yet re-hosted
#[derive(Debug, Clone)]
pub struct InboundMedia {
    pub bytes: Vec<u8>,
    pub content_type: String,
}
