//! Outbound message rendering
//!
//! All member-facing text is assembled here, in one voice.

use flock_core::entities::{Attachment, Broadcast, ReactionCount};
use flock_core::render_summary;

use crate::dto::{BroadcastOutcome, ReactionOutcome};

/// Preview length used when quoting a broadcast back to the roster
const PREVIEW_CHARS: usize = 50;

/// Footer appended to every rebroadcast message
const REPLY_FOOTER: &str = "📱 Reply to join the conversation!";

fn quoted_preview(broadcast: &Broadcast) -> String {
    let preview = broadcast.preview(PREVIEW_CHARS);
    if preview.len() < broadcast.text.len() {
        format!("\"{preview}…\"")
    } else {
        format!("\"{preview}\"")
    }
}

/// Full outbound text for a new broadcast
pub fn broadcast_message(
    sender_name: &str,
    text: &str,
    attachments: &[Attachment],
    failed_attachments: usize,
) -> String {
    let mut out = format!("💬 {sender_name}:\n{text}");

    for attachment in attachments {
        out.push_str(&format!("\n📎 {}", attachment.url));
    }
    if failed_attachments > 0 {
        let noun = if failed_attachments == 1 {
            "attachment"
        } else {
            "attachments"
        };
        out.push_str(&format!(
            "\n📎 ({failed_attachments} {noun} could not be processed)"
        ));
    }

    out.push_str(&format!("\n\n{REPLY_FOOTER}"));
    out
}

/// Re-broadcast of an updated reaction summary
pub fn reaction_update(broadcast: &Broadcast, summary: Option<&str>) -> String {
    match summary {
        Some(summary) => format!("💭 {} — {summary}", quoted_preview(broadcast)),
        None => format!("💭 Reactions cleared on {}", quoted_preview(broadcast)),
    }
}

/// One broadcast's entry in a digest
#[derive(Debug, Clone)]
pub struct DigestEntry {
    pub sender_name: String,
    pub preview: String,
    pub counts: Vec<ReactionCount>,
}

impl DigestEntry {
    pub fn total(&self) -> i64 {
        self.counts.iter().map(|c| c.count).sum()
    }
}

/// A digest message covering several broadcasts
pub fn digest_message(title: &str, entries: &[DigestEntry]) -> String {
    let mut out = format!("📊 {title}");
    for entry in entries {
        let summary = render_summary(&entry.counts).unwrap_or_else(|| "no reactions".to_string());
        out.push_str(&format!(
            "\n• {}: \"{}\" — {summary}",
            entry.sender_name, entry.preview
        ));
    }
    out
}

/// Admin confirmation after a fan-out settles
pub fn admin_confirmation(outcome: &BroadcastOutcome) -> String {
    let mut out = format!("✅ Broadcast sent to {} members", outcome.sent);
    if outcome.failed > 0 {
        out.push_str(&format!("\n⚠️ Failed deliveries: {}", outcome.failed));
    }
    out
}

/// Admin confirmation after a reaction is applied
pub fn reaction_ack(outcome: &ReactionOutcome) -> String {
    format!(
        "✅ Reaction {} ({}) — {}",
        outcome.action.as_str(),
        outcome.emoji,
        outcome
            .summary
            .as_deref()
            .unwrap_or("no active reactions")
    )
}

/// Help text; admins get the extra section
pub fn help_text(is_admin: bool) -> String {
    let mut out = String::from(
        "🏛️ FLOCK BROADCAST\n\n\
         📢 Text anything and it goes to the whole roster.\n\
         💭 React to a message (e.g. Loved \"...\", or just an emoji) and \
         reactions are tallied instead of forwarded one by one.\n\n\
         📱 COMMANDS:\n\
         • HELP - Show this message\n\
         • STATS - Roster and activity summary\n",
    );
    if is_admin {
        out.push_str("\n👑 ADMIN COMMANDS:\n• RECENT - View recent broadcasts\n");
    }
    out.push_str("\n💬 Just type your message to broadcast to everyone!");
    out
}

/// STATS reply
pub fn stats_text(member_count: i64, messages_this_week: i64) -> String {
    format!(
        "📊 FLOCK STATISTICS\n\n\
         👥 Active members: {member_count}\n\
         📈 Messages this week: {messages_this_week}"
    )
}

/// RECENT reply (admin)
pub fn recent_text(broadcasts: &[Broadcast]) -> String {
    if broadcasts.is_empty() {
        return "No recent broadcasts.".to_string();
    }

    let mut out = String::from("📋 Recent broadcasts:\n");
    for b in broadcasts {
        out.push_str(&format!("\n👤 {}\n💬 {}\n", b.sender_name, quoted_preview(b)));
    }
    out
}
