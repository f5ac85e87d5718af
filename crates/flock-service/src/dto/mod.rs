//! Data transfer objects for engine operations

mod responses;

pub use responses::{BroadcastOutcome, InboundMedia, ReactionOutcome};
