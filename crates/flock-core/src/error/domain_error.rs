//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::MessageId;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Rejections (sender-facing, no broadcast happens)
    // =========================================================================
    #[error("Sender not registered: {0}")]
    UnregisteredSender(String),

    #[error("No active recipients to send to")]
    NoRecipients,

    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Not Found
    // =========================================================================
    #[error("Broadcast not found: {0}")]
    BroadcastNotFound(MessageId),

    // =========================================================================
    // Per-item failures (absorbed into records, never batch-fatal)
    // =========================================================================
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Attachment processing failed: {0}")]
    AttachmentProcessingFailure(String),

    // =========================================================================
    // Systemic failures (batch-fatal, surfaced as a generic retry message)
    // =========================================================================
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for logs and records
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnregisteredSender(_) => "UNREGISTERED_SENDER",
            Self::NoRecipients => "NO_RECIPIENTS",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::BroadcastNotFound(_) => "UNKNOWN_BROADCAST",
            Self::TransportFailure(_) => "TRANSPORT_FAILURE",
            Self::AttachmentProcessingFailure(_) => "ATTACHMENT_FAILURE",
            Self::LedgerUnavailable(_) => "LEDGER_UNAVAILABLE",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a sender rejection (request refused, nothing sent)
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredSender(_)
                | Self::NoRecipients
                | Self::EmptyMessage
                | Self::ContentTooLong { .. }
                | Self::ValidationError(_)
        )
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BroadcastNotFound(_))
    }

    /// Check if this is a per-item failure that batches absorb and record
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            Self::TransportFailure(_) | Self::AttachmentProcessingFailure(_)
        )
    }

    /// Check if this is a systemic failure that aborts the operation
    pub fn is_systemic(&self) -> bool {
        matches!(self, Self::LedgerUnavailable(_) | Self::InternalError(_))
    }

    /// User-safe message. Systemic failures never leak detail to members;
    /// the full error goes to the logs instead.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnregisteredSender(_) => {
                "You're not on the broadcast roster yet. Contact an admin to be added.".to_string()
            }
            Self::NoRecipients => "No active members found to send to.".to_string(),
            Self::EmptyMessage => "Cannot broadcast an empty message.".to_string(),
            Self::ContentTooLong { max } => {
                format!("Message too long: keep it under {max} characters.")
            }
            Self::ValidationError(msg) => msg.clone(),
            Self::BroadcastNotFound(_) => "That message could not be found.".to_string(),
            Self::TransportFailure(_)
            | Self::AttachmentProcessingFailure(_)
            | Self::LedgerUnavailable(_)
            | Self::InternalError(_) => {
                "Something went wrong. Please try again in a moment.".to_string()
            }
        }
    }
}
