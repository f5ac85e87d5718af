//! DeliveryAttempt entity - one recipient's outcome for one outbound send

use chrono::{DateTime, Utc};

use crate::value_objects::MessageId;

/// Delivery status of a single recipient send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "delivered" => Some(Self::Delivered),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Terminal states are never mutated again
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One row per recipient per outbound send; never mutated after reaching a
/// terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAttempt {
    /// Broadcast id, or a synthetic id for digests and summary updates
    pub message_id: MessageId,
    pub recipient_address: String,
    pub status: DeliveryStatus,
    pub provider_id: Option<String>,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
}

impl DeliveryAttempt {
    /// Record a successful delivery
    pub fn delivered(
        message_id: MessageId,
        recipient_address: String,
        provider_id: Option<String>,
        duration_ms: i64,
        retry_count: i32,
    ) -> Self {
        Self {
            message_id,
            recipient_address,
            status: DeliveryStatus::Delivered,
            provider_id,
            error: None,
            duration_ms,
            retry_count,
            created_at: Utc::now(),
        }
    }

    /// Record a delivery that failed after retry exhaustion or timeout
    pub fn failed(
        message_id: MessageId,
        recipient_address: String,
        error: String,
        duration_ms: i64,
        retry_count: i32,
    ) -> Self {
        Self {
            message_id,
            recipient_address,
            status: DeliveryStatus::Failed,
            provider_id: None,
            error: Some(error),
            duration_ms,
            retry_count,
            created_at: Utc::now(),
        }
    }
}
