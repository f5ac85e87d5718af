//! Reaction entity <-> model mapper

use flock_core::entities::{Reaction, ReactionCount};
use flock_core::value_objects::MessageId;

use crate::models::{ReactionCountModel, ReactionModel};

/// Convert ReactionModel to Reaction entity
impl From<ReactionModel> for Reaction {
    fn from(model: ReactionModel) -> Self {
        Reaction {
            broadcast_id: MessageId::new(model.broadcast_id),
            reactor_address: model.reactor_address,
            reactor_name: model.reactor_name,
            emoji: model.emoji,
            previous_emoji: model.previous_emoji,
            is_active: model.is_active,
            processed: model.processed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Convert ReactionCountModel to ReactionCount
impl From<ReactionCountModel> for ReactionCount {
    fn from(model: ReactionCountModel) -> Self {
        ReactionCount {
            emoji: model.emoji,
            count: model.count,
        }
    }
}
