//! Digest scheduling
//!
//! One long-lived background task drives two triggers feeding the same
//! digest pipeline:
//!
//! - a single-shot pause timer, re-armed through a channel event every time
//!   a non-reaction broadcast is accepted, firing after a quiet period
//! - a daily timer firing at a fixed local wall-clock hour
//!
//! Both jobs run inline on the scheduler task, so digest emission is
//! serialized structurally: the pause digest and the daily digest can never
//! run concurrently or interleave their processed-flag updates.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone, Utc};
use tokio::sync::mpsc;
use tokio::time::Sleep;
use tracing::{debug, error, info, instrument};

use flock_core::entities::{Reaction, ReactionCount, ReactionKey};
use flock_core::value_objects::MessageId;

use super::broadcast::BroadcastEngine;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::format::{self, DigestEntry};

/// Events that mutate scheduler state, sent from the ingest path
#[derive(Debug, Clone, Copy)]
enum SchedulerEvent {
    /// A non-reaction broadcast was accepted: re-arm the pause timer
    BroadcastAccepted,
}

/// Preview length for digest lines
const DIGEST_PREVIEW_CHARS: usize = 40;

/// Broadcast entries in a daily digest
const DAILY_TOP_N: usize = 5;

/// Handle to the background digest scheduler.
///
/// The task owns all timer state; callers only send reset events. Dropping
/// every handle stops the task.
#[derive(Clone)]
pub struct DigestScheduler {
    tx: mpsc::UnboundedSender<SchedulerEvent>,
}

impl DigestScheduler {
    /// Spawn the scheduler task
    pub fn start(ctx: Arc<ServiceContext>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(ctx, rx));
        Self { tx }
    }

    /// Reset the silence timer; called whenever a new broadcast is accepted.
    /// Last writer wins: a pending fire from the previous arm is discarded.
    pub fn broadcast_accepted(&self) {
        let _ = self.tx.send(SchedulerEvent::BroadcastAccepted);
    }
}

/// Scheduler loop: single task, all timer state owned here
async fn run(ctx: Arc<ServiceContext>, mut rx: mpsc::UnboundedReceiver<SchedulerEvent>) {
    let pause_delay = Duration::from_secs(ctx.engine().pause_digest_minutes * 60);
    let daily_hour = ctx.engine().daily_digest_hour;

    // Armed only while a broadcast is awaiting its quiet period
    let mut pause_timer: Option<Pin<Box<Sleep>>> = None;
    let mut daily_timer = Box::pin(tokio::time::sleep(until_next_daily(daily_hour)));

    info!(
        pause_minutes = ctx.engine().pause_digest_minutes,
        daily_hour, "Digest scheduler started"
    );

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(SchedulerEvent::BroadcastAccepted) => {
                    debug!("pause timer re-armed");
                    pause_timer = Some(Box::pin(tokio::time::sleep(pause_delay)));
                }
                None => {
                    info!("all scheduler handles dropped, stopping");
                    break;
                }
            },
            () = async { pause_timer.as_mut().unwrap().await }, if pause_timer.is_some() => {
                // Single-shot: stays disarmed until the next broadcast
                pause_timer = None;
                if let Err(e) = run_pause_digest(&ctx).await {
                    error!(error = %e, "pause digest failed");
                }
            }
            () = &mut daily_timer => {
                daily_timer = Box::pin(tokio::time::sleep(until_next_daily(daily_hour)));
                if let Err(e) = run_daily_digest(&ctx).await {
                    error!(error = %e, "daily digest failed");
                }
            }
        }
    }
}

/// Wall-clock duration until the next local occurrence of `hour`:00
fn until_next_daily(hour: u32) -> Duration {
    let now = Local::now();
    let mut target_date = now.date_naive();
    loop {
        if let Some(naive) = target_date.and_hms_opt(hour, 0, 0) {
            if let Some(target) = Local.from_local_datetime(&naive).earliest() {
                if target > now {
                    let delta = target - now;
                    return delta.to_std().unwrap_or(Duration::from_secs(60));
                }
            }
        }
        target_date = match target_date.succ_opt() {
            Some(d) => d,
            None => return Duration::from_secs(24 * 60 * 60),
        };
    }
}

/// Pause digest: everything unprocessed from the recent window
#[instrument(skip(ctx))]
async fn run_pause_digest(ctx: &Arc<ServiceContext>) -> ServiceResult<()> {
    let since = Utc::now() - chrono::Duration::hours(ctx.engine().digest_window_hours);
    let reactions = ctx.reactions().unprocessed_since(since).await?;
    if reactions.is_empty() {
        debug!("no unprocessed reactions, skipping pause digest");
        return Ok(());
    }

    emit_digest(ctx, "Reaction digest", reactions, None).await
}

/// Daily digest: the day's unprocessed reactions, top broadcasts only
#[instrument(skip(ctx))]
async fn run_daily_digest(ctx: &Arc<ServiceContext>) -> ServiceResult<()> {
    let since = Utc::now() - chrono::Duration::hours(24);
    let reactions = ctx.reactions().unprocessed_since(since).await?;
    if reactions.is_empty() {
        debug!("no unprocessed reactions, skipping daily digest");
        return Ok(());
    }

    emit_digest(ctx, "Today's reactions", reactions, Some(DAILY_TOP_N)).await
}

/// Group reactions by target broadcast, render, send, then mark processed.
///
/// Marking happens only after the engine accepted the digest, so a failed
/// send leaves the reactions eligible for the next trigger.
async fn emit_digest(
    ctx: &Arc<ServiceContext>,
    title: &str,
    reactions: Vec<Reaction>,
    top_n: Option<usize>,
) -> ServiceResult<()> {
    let keys: Vec<ReactionKey> = reactions.iter().map(Reaction::key).collect();

    // Group by broadcast, then by emoji
    let mut by_broadcast: BTreeMap<MessageId, BTreeMap<String, i64>> = BTreeMap::new();
    for reaction in &reactions {
        *by_broadcast
            .entry(reaction.broadcast_id)
            .or_default()
            .entry(reaction.emoji.clone())
            .or_insert(0) += 1;
    }

    let mut entries = Vec::with_capacity(by_broadcast.len());
    for (broadcast_id, emoji_counts) in by_broadcast {
        let Some(broadcast) = ctx.broadcasts().find_by_id(broadcast_id).await? else {
            continue;
        };
        let counts: Vec<ReactionCount> = emoji_counts
            .into_iter()
            .map(|(emoji, count)| ReactionCount::new(emoji, count))
            .collect();
        entries.push(DigestEntry {
            sender_name: broadcast.sender_name.clone(),
            preview: broadcast.preview(DIGEST_PREVIEW_CHARS).to_string(),
            counts,
        });
    }

    if entries.is_empty() {
        return Ok(());
    }

    // Most-reacted broadcasts first; the daily digest keeps only the top N
    entries.sort_by(|a, b| b.total().cmp(&a.total()));
    if let Some(n) = top_n {
        entries.truncate(n);
    }

    let text = format::digest_message(title, &entries);
    let engine = BroadcastEngine::new(ctx);
    let outcome = engine.broadcast_digest(&text).await?;

    ctx.reactions().mark_processed(&keys).await?;

    info!(
        title,
        reactions = keys.len(),
        broadcasts = entries.len(),
        sent = outcome.sent,
        failed = outcome.failed,
        "Digest sent"
    );
    Ok(())
}
