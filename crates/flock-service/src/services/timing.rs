//! Update timing policy
//!
//! Decides whether an aggregated-count change is worth re-broadcasting.
//! Most reaction mutations are recorded silently; this is the mechanism
//! that prevents one notification per reaction.

use flock_core::entities::ReactionAction;

/// Re-broadcast every Nth active reaction
const NOTIFY_EVERY: i64 = 3;

/// Quiet window: re-broadcast when this many minutes passed since the last
/// summary update and a reaction just landed
const QUIET_MINUTES: i64 = 5;

/// Decide whether to re-broadcast the updated summary now.
///
/// `minutes_since_last_update` is measured against the broadcast's summary
/// timestamp as it was before this mutation; `None` means the broadcast has
/// never had a reaction update.
///
/// Sends now when any of:
/// - this is the first reaction ever on the broadcast
/// - a reaction was removed
/// - the active total hit a multiple of three
/// - more than five minutes passed since the previous update and at least
///   one reaction (this one) landed since
pub fn should_notify(
    total_active: i64,
    action: ReactionAction,
    minutes_since_last_update: Option<i64>,
) -> bool {
    if total_active == 1 {
        return true;
    }
    if action == ReactionAction::Removed {
        return true;
    }
    if total_active > 0 && total_active % NOTIFY_EVERY == 0 {
        return true;
    }
    minutes_since_last_update.is_some_and(|m| m > QUIET_MINUTES)
}
