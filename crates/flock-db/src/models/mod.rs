//! Database models with SQLx FromRow derives

mod broadcast;
mod delivery;
mod member;
mod reaction;

pub use broadcast::BroadcastModel;
pub use delivery::DeliveryAttemptModel;
pub use member::MemberModel;
pub use reaction::{ReactionCountModel, ReactionModel};
