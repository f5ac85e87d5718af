//! Reaction entity - a single reactor's emoji state on one broadcast
//!
//! The row is unique per (broadcast_id, reactor_address): a reactor has at
//! most one reaction per broadcast, mutated in place on every later reaction.

use chrono::{DateTime, Utc};

use crate::value_objects::MessageId;

/// What a reaction application did to the row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
    Added,
    Removed,
    Changed,
}

impl ReactionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
        }
    }
}

/// Unique key of a reaction row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReactionKey {
    pub broadcast_id: MessageId,
    pub reactor_address: String,
}

/// Reaction entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub broadcast_id: MessageId,
    pub reactor_address: String,
    pub reactor_name: String,
    pub emoji: String,
    pub previous_emoji: Option<String>,
    pub is_active: bool,
    /// Set once a digest has included this reaction; monotonic, never cleared
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reaction {
    /// Create a fresh, active reaction
    pub fn new(
        broadcast_id: MessageId,
        reactor_address: String,
        reactor_name: String,
        emoji: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            broadcast_id,
            reactor_address,
            reactor_name,
            emoji,
            previous_emoji: None,
            is_active: true,
            processed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Unique row key
    pub fn key(&self) -> ReactionKey {
        ReactionKey {
            broadcast_id: self.broadcast_id,
            reactor_address: self.reactor_address.clone(),
        }
    }

    /// Apply a new emoji from the same reactor to this existing row.
    ///
    /// Same emoji toggles `is_active`; a different emoji replaces it and
    /// re-activates, remembering the old one in `previous_emoji`.
    pub fn apply(&mut self, new_emoji: &str, at: DateTime<Utc>) -> ReactionAction {
        self.updated_at = at;
        if self.emoji == new_emoji {
            self.is_active = !self.is_active;
            if self.is_active {
                ReactionAction::Added
            } else {
                ReactionAction::Removed
            }
        } else {
            self.previous_emoji = Some(std::mem::replace(&mut self.emoji, new_emoji.to_string()));
            self.is_active = true;
            ReactionAction::Changed
        }
    }
}

/// Aggregated per-emoji count of active reactions on one broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCount {
    pub emoji: String,
    pub count: i64,
}

impl ReactionCount {
    pub fn new(emoji: String, count: i64) -> Self {
        Self { emoji, count }
    }
}

/// Render the count summary line for a broadcast.
///
/// Counts are sorted by count descending, then emoji lexically. Counts of 1
/// omit the multiplier. Returns `None` when there are no active reactions.
pub fn render_summary(counts: &[ReactionCount]) -> Option<String> {
    let total: i64 = counts.iter().map(|c| c.count).sum();
    if total == 0 {
        return None;
    }

    let mut sorted: Vec<&ReactionCount> = counts.iter().filter(|c| c.count > 0).collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.emoji.cmp(&b.emoji)));

    let parts: Vec<String> = sorted
        .iter()
        .map(|c| {
            if c.count == 1 {
                c.emoji.clone()
            } else {
                format!("{}×{}", c.emoji, c.count)
            }
        })
        .collect();

    let noun = if total == 1 { "reaction" } else { "reactions" };
    Some(format!("{total} {noun}: {}", parts.join(" ")))
}
