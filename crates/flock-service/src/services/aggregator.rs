//! Reaction aggregation
//!
//! Applies a detected reaction to the single (broadcast, reactor) row with
//! toggle/replace/remove semantics, recomputes the count summary in the
//! same operation, and evaluates the timing policy. Dispatching the
//! resulting notification is the caller's job, so this stays testable
//! without a live transport.

use chrono::Utc;
use tracing::{info, instrument};

use flock_core::entities::{render_summary, Broadcast, Reaction, ReactionAction};

use crate::dto::ReactionOutcome;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::timing::should_notify;

/// Reaction aggregator
pub struct ReactionAggregator<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReactionAggregator<'a> {
    /// Create a new ReactionAggregator
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Apply one reaction and recompute the broadcast's summary.
    ///
    /// Transition table for the (broadcast, reactor) row:
    /// - no row: insert active
    /// - same emoji, active: toggle off
    /// - same emoji, inactive: toggle back on
    /// - different emoji: replace and re-activate
    ///
    /// The row mutation and summary recompute run under a lock scoped to
    /// this one row; reactions from other reactors proceed concurrently.
    #[instrument(skip(self, broadcast), fields(broadcast_id = %broadcast.id, reactor = %reactor_address))]
    pub async fn apply(
        &self,
        broadcast: &Broadcast,
        reactor_address: &str,
        reactor_name: &str,
        emoji: &str,
    ) -> ServiceResult<ReactionOutcome> {
        let now = Utc::now();

        let (reaction, action) = {
            let key = flock_core::entities::ReactionKey {
                broadcast_id: broadcast.id,
                reactor_address: reactor_address.to_string(),
            };
            let lock = self.ctx.reaction_lock(&key);
            let _guard = lock.lock().await;

            let (reaction, action) = match self
                .ctx
                .reactions()
                .find(broadcast.id, reactor_address)
                .await?
            {
                None => {
                    let reaction = Reaction::new(
                        broadcast.id,
                        reactor_address.to_string(),
                        reactor_name.to_string(),
                        emoji.to_string(),
                    );
                    (reaction, ReactionAction::Added)
                }
                Some(mut existing) => {
                    let action = existing.apply(emoji, now);
                    (existing, action)
                }
            };

            self.ctx.reactions().upsert(&reaction).await?;
            (reaction, action)
        };

        // Recompute the summary synchronously: it must never go stale
        // relative to the reaction store.
        let counts = self.ctx.reactions().active_counts(broadcast.id).await?;
        let total_active: i64 = counts.iter().map(|c| c.count).sum();
        let summary = render_summary(&counts);

        self.ctx
            .broadcasts()
            .update_summary(broadcast.id, summary.as_deref(), now)
            .await?;

        // The policy sees the summary timestamp as it was before this
        // mutation; the reaction that just landed is the "since then" one.
        let minutes_since_last_update = broadcast
            .last_reaction_update
            .map(|t| (now - t).num_minutes());
        let notify = should_notify(total_active, action, minutes_since_last_update);

        info!(
            broadcast_id = %broadcast.id,
            emoji = %reaction.emoji,
            action = action.as_str(),
            total_active,
            notify,
            "Reaction applied"
        );

        Ok(ReactionOutcome {
            broadcast_id: broadcast.id,
            action,
            emoji: reaction.emoji,
            total_active,
            summary,
            notify,
        })
    }
}
