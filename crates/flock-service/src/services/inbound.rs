//! Inbound dispatch
//!
//! Entry point for the ingress layer: classify one inbound message and run
//! it through the engine. Reaction phrases update aggregation state; small
//! commands get direct replies; everything else becomes a new broadcast.
//!
//! Reply contract: regular members get silence on success, a reply only on
//! rejection. Admins additionally get confirmations.

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};

use flock_core::entities::{Attachment, Member};
use flock_core::error::DomainError;

use crate::dto::InboundMedia;

use super::aggregator::ReactionAggregator;
use super::broadcast::BroadcastEngine;
use super::context::ServiceContext;
use super::detector::detect_reaction;
use super::digest::DigestScheduler;
use super::error::{ServiceError, ServiceResult};
use super::format;
use super::resolver::TargetMessageResolver;

/// Broadcasts shown by the admin RECENT command
const RECENT_LIMIT: i64 = 5;

/// Inbound message dispatcher
pub struct InboundService<'a> {
    ctx: &'a ServiceContext,
    scheduler: Option<&'a DigestScheduler>,
}

impl<'a> InboundService<'a> {
    /// Create a dispatcher without a digest scheduler (tests, one-shot tools)
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self {
            ctx,
            scheduler: None,
        }
    }

    /// Attach the digest scheduler so accepted broadcasts reset its
    /// silence timer
    pub fn with_scheduler(mut self, scheduler: &'a DigestScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Handle one inbound message. Returns the reply text to send back to
    /// the sender, if any.
    #[instrument(skip(self, text, media), fields(sender = %sender_address))]
    pub async fn handle_inbound(
        &self,
        sender_address: &str,
        text: &str,
        media: Vec<InboundMedia>,
    ) -> ServiceResult<Option<String>> {
        let text = text.trim();

        let Some(member) = self.ctx.directory().identity(sender_address).await? else {
            warn!("rejecting message from unregistered sender");
            return Ok(Some(
                DomainError::UnregisteredSender(sender_address.to_string()).user_message(),
            ));
        };

        // Command layer: exact matches only; anything else falls through
        // to the broadcast path
        if let Some(reply) = self.try_command(&member, text).await? {
            return Ok(Some(reply));
        }

        // Reaction path
        if let Some(detected) = detect_reaction(text) {
            return self.handle_reaction(&member, &detected).await;
        }

        // Broadcast path
        self.handle_broadcast(&member, text, media).await
    }

    /// HELP / STATS for everyone, RECENT for admins
    async fn try_command(&self, member: &Member, text: &str) -> ServiceResult<Option<String>> {
        match text.to_uppercase().as_str() {
            "HELP" | "H" | "?" => Ok(Some(format::help_text(member.is_admin))),
            "STATS" => {
                let members = self.ctx.directory().member_count().await?;
                let week_ago = Utc::now() - Duration::days(7);
                let messages = self.ctx.broadcasts().count_since(week_ago).await?;
                Ok(Some(format::stats_text(members, messages)))
            }
            "RECENT" if member.is_admin => {
                let latest = self.ctx.broadcasts().latest(RECENT_LIMIT).await?;
                Ok(Some(format::recent_text(&latest)))
            }
            _ => Ok(None),
        }
    }

    /// Resolve, aggregate, and conditionally re-broadcast the summary
    async fn handle_reaction(
        &self,
        member: &Member,
        detected: &super::detector::DetectedReaction,
    ) -> ServiceResult<Option<String>> {
        let resolver = TargetMessageResolver::new(self.ctx);
        let Some(broadcast) = resolver
            .resolve(&detected.target_fragment, &member.address)
            .await?
        else {
            // Zero candidates in the window: drop silently, keep the record
            // in the logs only
            warn!(
                pattern = detected.raw_pattern,
                "reaction had no candidate broadcast, dropping"
            );
            return Ok(None);
        };

        let aggregator = ReactionAggregator::new(self.ctx);
        let outcome = aggregator
            .apply(&broadcast, &member.address, &member.name, &detected.emoji)
            .await?;

        if outcome.notify {
            let engine = BroadcastEngine::new(self.ctx);
            if let Err(e) = engine
                .dispatch_update(&broadcast, outcome.summary.as_deref())
                .await
            {
                // The reaction is already recorded; a failed update send
                // must not bubble up as a reaction failure
                warn!(error = %e, "summary update dispatch failed");
            }
        }

        if member.is_admin {
            Ok(Some(format::reaction_ack(&outcome)))
        } else {
            Ok(None)
        }
    }

    /// Store attachments, fan the broadcast out, reset the silence timer
    async fn handle_broadcast(
        &self,
        member: &Member,
        text: &str,
        media: Vec<InboundMedia>,
    ) -> ServiceResult<Option<String>> {
        if text.is_empty() && media.is_empty() {
            return Ok(Some(DomainError::EmptyMessage.user_message()));
        }

        let (attachments, failed_attachments) = self.store_attachments(media).await;

        let engine = BroadcastEngine::new(self.ctx);
        match engine
            .broadcast(member, text, &attachments, failed_attachments)
            .await
        {
            Ok(outcome) => {
                if let Some(scheduler) = self.scheduler {
                    scheduler.broadcast_accepted();
                }
                info!(
                    message_id = %outcome.message_id,
                    sent = outcome.sent,
                    failed = outcome.failed,
                    "Broadcast accepted"
                );
                if member.is_admin {
                    Ok(Some(format::admin_confirmation(&outcome)))
                } else {
                    // Silent success for regular members
                    Ok(None)
                }
            }
            Err(ServiceError::Domain(DomainError::NoRecipients)) => {
                // Surfaced to admin senders only
                if member.is_admin {
                    Ok(Some(DomainError::NoRecipients.user_message()))
                } else {
                    Ok(None)
                }
            }
            Err(e) if e.is_systemic() => {
                warn!(error = %e, "broadcast failed systemically");
                Ok(Some(e.user_message()))
            }
            Err(e) => Err(e),
        }
    }

    /// Re-host inbound media; failures degrade to text-only with a note
    async fn store_attachments(&self, media: Vec<InboundMedia>) -> (Vec<Attachment>, usize) {
        let mut attachments = Vec::with_capacity(media.len());
        let mut failed = 0;

        for item in media {
            match self
                .ctx
                .blob_store()
                .store(&item.bytes, &item.content_type)
                .await
            {
                Ok(url) => attachments.push(Attachment::new(url, item.content_type)),
                Err(e) => {
                    warn!(error = %e, mime = %item.content_type, "attachment processing failed");
                    failed += 1;
                }
            }
        }

        (attachments, failed)
    }
}
