//! Delivery attempt entity <-> model mapper

use flock_core::entities::{DeliveryAttempt, DeliveryStatus};
use flock_core::value_objects::MessageId;

use crate::models::DeliveryAttemptModel;

/// Convert DeliveryAttemptModel to DeliveryAttempt entity
impl From<DeliveryAttemptModel> for DeliveryAttempt {
    fn from(model: DeliveryAttemptModel) -> Self {
        DeliveryAttempt {
            message_id: MessageId::new(model.message_id),
            recipient_address: model.recipient_address,
            status: DeliveryStatus::parse(&model.status).unwrap_or(DeliveryStatus::Failed),
            provider_id: model.provider_id,
            error: model.error,
            duration_ms: model.duration_ms,
            retry_count: model.retry_count,
            created_at: model.created_at,
        }
    }
}
