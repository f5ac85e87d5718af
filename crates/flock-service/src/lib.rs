//! # flock-service
//!
//! Application layer: the broadcast & reaction aggregation engine.
//!
//! Inbound text flows through [`services::InboundService`]: reaction
//! phrases are detected, resolved against recent broadcasts, and folded
//! into per-reactor reaction state; everything else becomes a new broadcast
//! fanned out to the roster by [`services::BroadcastEngine`]. A background
//! [`services::DigestScheduler`] batches reaction summaries on silence and
//! on a daily schedule.

pub mod dto;
pub mod services;

pub use dto::{BroadcastOutcome, InboundMedia, ReactionOutcome};
pub use services::{
    BroadcastEngine, DigestScheduler, InboundService, ReactionAggregator, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, TargetMessageResolver,
};
