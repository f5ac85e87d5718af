//! Broadcast entity <-> model mapper

use flock_core::entities::Broadcast;
use flock_core::value_objects::MessageId;

use crate::models::BroadcastModel;

/// Convert BroadcastModel to Broadcast entity
impl From<BroadcastModel> for Broadcast {
    fn from(model: BroadcastModel) -> Self {
        Broadcast {
            id: MessageId::new(model.id),
            sender_address: model.sender_address,
            sender_name: model.sender_name,
            text: model.body,
            created_at: model.created_at,
            reaction_summary: model.reaction_summary,
            last_reaction_update: model.last_reaction_update,
        }
    }
}
