//! Broadcast entity - a message sent by one member for delivery to the whole roster

use chrono::{DateTime, Utc};

use crate::value_objects::MessageId;

/// Broadcast entity
///
/// Immutable once created, except for the derived `reaction_summary` and
/// `last_reaction_update`, which are owned exclusively by the reaction
/// aggregator and recomputed on every reaction mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub id: MessageId,
    pub sender_address: String,
    pub sender_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub reaction_summary: Option<String>,
    pub last_reaction_update: Option<DateTime<Utc>>,
}

impl Broadcast {
    /// Create a new Broadcast
    pub fn new(
        id: MessageId,
        sender_address: String,
        sender_name: String,
        text: String,
    ) -> Self {
        Self {
            id,
            sender_address,
            sender_name,
            text,
            created_at: Utc::now(),
            reaction_summary: None,
            last_reaction_update: None,
        }
    }

    /// Check if the broadcast has any active reactions
    #[inline]
    pub fn has_reactions(&self) -> bool {
        self.reaction_summary.is_some()
    }

    /// Check if broadcast text is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Get a truncated preview of the text (for digests and the RECENT command)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.text.len() <= max_len {
            &self.text
        } else {
            let mut end = max_len;
            while !self.text.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.text[..end]
        }
    }
}

/// A stored attachment, already re-hosted and reachable by URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub content_type: String,
}

impl Attachment {
    /// Create a new Attachment
    pub fn new(url: String, content_type: String) -> Self {
        Self { url, content_type }
    }

    /// Check if attachment is an image
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Check if attachment is a video
    pub fn is_video(&self) -> bool {
        self.content_type.starts_with("video/")
    }

    /// Check if attachment is audio
    pub fn is_audio(&self) -> bool {
        self.content_type.starts_with("audio/")
    }
}
