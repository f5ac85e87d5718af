//! Broadcast database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the broadcasts table
#[derive(Debug, Clone, FromRow)]
pub struct BroadcastModel {
    pub id: i64,
    pub sender_address: String,
    pub sender_name: String,
    pub body: String,
    pub reaction_summary: Option<String>,
    pub last_reaction_update: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl BroadcastModel {
    /// Check if any active reactions have been aggregated onto this row
    #[inline]
    pub fn has_summary(&self) -> bool {
        self.reaction_summary.is_some()
    }
}
