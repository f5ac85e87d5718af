//! Broadcast engine
//!
//! Fans one outbound message out to the full roster on a bounded worker
//! pool. Each recipient gets up to `max_send_attempts` tries with linear
//! backoff inside an overall per-recipient timeout; a hung recipient can
//! never stall the batch beyond that timeout. Individual failures are
//! recorded and absorbed; only zero recipients and ledger/directory
//! unavailability abort a batch.

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use flock_core::entities::{Attachment, Broadcast, DeliveryAttempt, Member};
use flock_core::error::DomainError;
use flock_core::traits::{SendReceipt, TransportError};
use flock_core::value_objects::MessageId;

use crate::dto::BroadcastOutcome;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::format;

/// Broadcast engine
pub struct BroadcastEngine<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> BroadcastEngine<'a> {
    /// Create a new BroadcastEngine
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Accept a new broadcast from a member and fan it out to everyone else.
    ///
    /// The broadcast row is persisted before any send happens, so the
    /// ledger's history (which backs reaction resolution) never misses an
    /// accepted message.
    #[instrument(skip(self, text, attachments), fields(sender = %sender.address))]
    pub async fn broadcast(
        &self,
        sender: &Member,
        text: &str,
        attachments: &[Attachment],
        failed_attachments: usize,
    ) -> ServiceResult<BroadcastOutcome> {
        let recipients = self
            .ctx
            .directory()
            .active_recipients(Some(&sender.address))
            .await?;
        if recipients.is_empty() {
            return Err(DomainError::NoRecipients.into());
        }

        let broadcast = Broadcast::new(
            self.ctx.generate_id(),
            sender.address.clone(),
            sender.name.clone(),
            text.to_string(),
        );
        self.ctx.broadcasts().save(&broadcast).await?;

        let formatted =
            format::broadcast_message(&sender.name, text, attachments, failed_attachments);

        self.fan_out(broadcast.id, &recipients, &formatted).await
    }

    /// Re-broadcast an updated reaction summary.
    ///
    /// Synthetic send: a fresh id keys the delivery log but no broadcast
    /// row is persisted, so summary updates never become reaction targets.
    #[instrument(skip(self, broadcast, summary), fields(broadcast_id = %broadcast.id))]
    pub async fn dispatch_update(
        &self,
        broadcast: &Broadcast,
        summary: Option<&str>,
    ) -> ServiceResult<BroadcastOutcome> {
        let recipients = self.ctx.directory().active_recipients(None).await?;
        if recipients.is_empty() {
            return Err(DomainError::NoRecipients.into());
        }

        let formatted = format::reaction_update(broadcast, summary);
        self.fan_out(self.ctx.generate_id(), &recipients, &formatted)
            .await
    }

    /// Send a digest to the full roster (synthetic, non-persisted message)
    #[instrument(skip(self, text))]
    pub async fn broadcast_digest(&self, text: &str) -> ServiceResult<BroadcastOutcome> {
        let recipients = self.ctx.directory().active_recipients(None).await?;
        if recipients.is_empty() {
            return Err(DomainError::NoRecipients.into());
        }

        self.fan_out(self.ctx.generate_id(), &recipients, text).await
    }

    /// Concurrent, bounded, retrying delivery to every recipient.
    ///
    /// Pool size is fixed by configuration, independent of roster size.
    /// The batch settles when every dispatch reached a terminal state; the
    /// delivery log is written once afterwards.
    async fn fan_out(
        &self,
        message_id: MessageId,
        recipients: &[Member],
        text: &str,
    ) -> ServiceResult<BroadcastOutcome> {
        let started = Instant::now();

        let mut deliveries = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            deliveries.push(self.deliver(message_id, &recipient.address, text));
        }
        let attempts: Vec<DeliveryAttempt> = stream::iter(deliveries)
            .buffer_unordered(self.ctx.engine().fanout_workers)
            .collect()
            .await;

        let sent = attempts
            .iter()
            .filter(|a| a.status == flock_core::entities::DeliveryStatus::Delivered)
            .count();
        let failed = attempts.len() - sent;

        // Nothing is dropped silently: every attempt lands in the log
        // before the batch reports completion.
        self.ctx.deliveries().record(&attempts).await?;

        let elapsed = started.elapsed();
        info!(
            message_id = %message_id,
            sent,
            failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "Fan-out settled"
        );

        Ok(BroadcastOutcome {
            message_id,
            sent,
            failed,
            elapsed,
        })
    }

    /// Deliver to one recipient: retry loop inside an overall timeout
    async fn deliver(
        &self,
        message_id: MessageId,
        address: &str,
        text: &str,
    ) -> DeliveryAttempt {
        let timeout = Duration::from_secs(self.ctx.engine().send_timeout_secs);
        let started = Instant::now();

        let result = tokio::time::timeout(timeout, self.send_with_retries(address, text)).await;
        let duration_ms = started.elapsed().as_millis() as i64;

        match result {
            Ok(Ok((receipt, attempts))) => DeliveryAttempt::delivered(
                message_id,
                address.to_string(),
                receipt.provider_id,
                duration_ms,
                attempts.saturating_sub(1) as i32,
            ),
            Ok(Err((err, attempts))) => {
                warn!(to = %address, error = %err, attempts, "delivery failed");
                DeliveryAttempt::failed(
                    message_id,
                    address.to_string(),
                    err.to_string(),
                    duration_ms,
                    attempts.saturating_sub(1) as i32,
                )
            }
            Err(_) => {
                warn!(to = %address, timeout_secs = timeout.as_secs(), "delivery timed out");
                DeliveryAttempt::failed(
                    message_id,
                    address.to_string(),
                    format!("timed out after {}s", timeout.as_secs()),
                    duration_ms,
                    self.ctx.engine().max_send_attempts.saturating_sub(1) as i32,
                )
            }
        }
    }

    /// Up to `max_send_attempts` tries with linear backoff (1s × attempt)
    async fn send_with_retries(
        &self,
        address: &str,
        text: &str,
    ) -> Result<(SendReceipt, u32), (TransportError, u32)> {
        let max_attempts = self.ctx.engine().max_send_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.ctx.transport().send(address, text).await {
                Ok(receipt) => return Ok((receipt, attempt)),
                Err(err) if attempt >= max_attempts => return Err((err, attempt)),
                Err(err) => {
                    warn!(to = %address, attempt, error = %err, "send failed, retrying");
                    tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                }
            }
        }
    }
}
