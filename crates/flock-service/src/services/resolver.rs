//! Target message resolution
//!
//! Maps a detected reaction's quoted fragment onto the broadcast it most
//! plausibly refers to, over a bounded window of recent messages. As long
//! as at least one candidate exists the resolver always returns one: an
//! unconfident reaction still attaches to the most recent message rather
//! than being dropped. `None` strictly means zero candidates.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use tracing::{debug, instrument};

use flock_core::entities::Broadcast;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Candidates fetched per resolution
const CANDIDATE_LIMIT: i64 = 10;

/// Minimum similarity for a scored match; below this the most recent
/// candidate wins by fallback
const SCORE_THRESHOLD: f64 = 0.3;

/// Bonus when the fragment appears verbatim (case-insensitive) in the text
const SUBSTRING_BONUS: f64 = 0.5;

/// Word-overlap similarity between the quoted fragment and a candidate text.
///
/// `|common words| / max(|fragment words|, |message words|)` over lowercased
/// whitespace tokens, plus the substring bonus.
fn score(fragment: &str, text: &str) -> f64 {
    let fragment_lower = fragment.to_lowercase();
    let text_lower = text.to_lowercase();

    let fragment_words: HashSet<&str> = fragment_lower.split_whitespace().collect();
    let text_words: HashSet<&str> = text_lower.split_whitespace().collect();

    let denom = fragment_words.len().max(text_words.len());
    let mut s = if denom == 0 {
        0.0
    } else {
        fragment_words.intersection(&text_words).count() as f64 / denom as f64
    };

    if !fragment_lower.is_empty() && text_lower.contains(&fragment_lower) {
        s += SUBSTRING_BONUS;
    }

    s
}

/// Resolves reaction fragments to recent broadcasts
pub struct TargetMessageResolver<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TargetMessageResolver<'a> {
    /// Create a new TargetMessageResolver
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Find the best-matching recent broadcast for a reaction.
    ///
    /// Candidates are the most recent broadcasts inside the lookback window,
    /// excluding the reactor's own messages. Returns `None` only when no
    /// candidate exists at all.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        target_fragment: &str,
        reactor_address: &str,
    ) -> ServiceResult<Option<Broadcast>> {
        let since = Utc::now() - Duration::hours(self.ctx.engine().lookback_hours);
        let candidates = self
            .ctx
            .broadcasts()
            .recent(since, Some(reactor_address), CANDIDATE_LIMIT)
            .await?;

        if candidates.is_empty() {
            return Ok(None);
        }

        // Bare-emoji reactions carry no fragment: most recent wins
        if target_fragment.is_empty() {
            return Ok(candidates.into_iter().next());
        }

        // Candidates come newest-first, so on equal scores the first
        // (most recent) seen is kept.
        let mut best_index = 0;
        let mut best_score = f64::MIN;
        for (i, candidate) in candidates.iter().enumerate() {
            let s = score(target_fragment, &candidate.text);
            if s > best_score {
                best_score = s;
                best_index = i;
            }
        }

        let chosen = if best_score > SCORE_THRESHOLD {
            best_index
        } else {
            // Unconfident: fall back to the most recent candidate
            debug!(
                best_score,
                fragment = %target_fragment,
                "no candidate above threshold, falling back to most recent"
            );
            0
        };

        Ok(candidates.into_iter().nth(chosen))
    }
}
