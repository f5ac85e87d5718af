//! Delivery attempt database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the delivery_attempts table
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryAttemptModel {
    pub id: i64,
    pub message_id: i64,
    pub recipient_address: String,
    pub status: String,
    pub provider_id: Option<String>,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
}
