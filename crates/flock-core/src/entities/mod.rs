//! Domain entities - core business objects

mod broadcast;
mod delivery;
mod member;
mod reaction;

pub use broadcast::{Attachment, Broadcast};
pub use delivery::{DeliveryAttempt, DeliveryStatus};
pub use member::Member;
pub use reaction::{render_summary, Reaction, ReactionAction, ReactionCount, ReactionKey};
