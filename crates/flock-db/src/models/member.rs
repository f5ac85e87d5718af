//! Member database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the members table
#[derive(Debug, Clone, FromRow)]
pub struct MemberModel {
    pub address: String,
    pub name: String,
    pub is_admin: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
