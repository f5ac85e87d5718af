//! Reaction phrase detection
//!
//! Classifies inbound text as a reaction or a new broadcast. Recognized
//! forms, checked in order, first match wins:
//!
//! 1. `<Verb> "<quoted text>"` with the fixed verb-to-emoji mapping
//! 2. `Reacted <emoji> to "<quoted text>"` - emoji taken verbatim
//! 3. A message that is nothing but emoji
//! 4. `<emoji> to "<quoted text>"`
//!
//! Both straight and curly quote characters are accepted. Anything that
//! matches none of these is a new broadcast.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of the quoted target fragment, in characters
const MAX_FRAGMENT_CHARS: usize = 100;

/// A detected reaction phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedReaction {
    /// The emoji to apply, from the fixed verb mapping or taken verbatim
    pub emoji: String,
    /// Quoted text identifying the target broadcast; empty for bare emoji
    pub target_fragment: String,
    /// Which form matched, for logging
    pub raw_pattern: &'static str,
}

static VERB_QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^(loved|liked|disliked|laughed at|emphasized|questioned)\s+["“”‘’'](.+)["“”‘’']$"#,
    )
    .unwrap()
});

static REACTED_TO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)^reacted\s+(\S+)\s+to\s+["“”‘’'](.+)["“”‘’']$"#).unwrap()
});

static EMOJI_TO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)^(\S+)\s+to\s+["“”‘’'](.+)["“”‘’']$"#).unwrap());

/// Fixed verb-to-emoji mapping (the tapback vocabulary)
fn verb_emoji(verb: &str) -> Option<&'static str> {
    match verb.to_lowercase().as_str() {
        "loved" => Some("❤️"),
        "liked" => Some("👍"),
        "disliked" => Some("👎"),
        "laughed at" => Some("😂"),
        "emphasized" => Some("‼️"),
        "questioned" => Some("❓"),
        _ => None,
    }
}

/// Check whether a char sits in one of the common emoji blocks
fn is_emoji_char(c: char) -> bool {
    matches!(c,
        '\u{1F300}'..='\u{1F5FF}'   // symbols & pictographs
        | '\u{1F600}'..='\u{1F64F}' // emoticons
        | '\u{1F680}'..='\u{1F6FF}' // transport & map
        | '\u{1F900}'..='\u{1F9FF}' // supplemental symbols
        | '\u{1FA70}'..='\u{1FAFF}' // extended-A
        | '\u{1F1E6}'..='\u{1F1FF}' // regional indicators
        | '\u{2600}'..='\u{26FF}'   // miscellaneous symbols
        | '\u{2700}'..='\u{27BF}'   // dingbats (includes ❤ and ❓)
        | '\u{2B00}'..='\u{2BFF}'   // arrows & stars (⭐)
        | '\u{203C}'                // ‼
        | '\u{2049}'                // ⁉
        | '\u{2764}'                // ❤
    )
}

/// Combining marks that ride along with emoji sequences
fn is_emoji_modifier(c: char) -> bool {
    matches!(c,
        '\u{FE0E}' | '\u{FE0F}'     // variation selectors
        | '\u{200D}'                // zero-width joiner
        | '\u{20E3}'                // combining keycap
        | '\u{1F3FB}'..='\u{1F3FF}' // skin tone modifiers
    )
}

/// A token counts as an emoji when every char belongs to an emoji sequence
/// and at least one is an emoji base char
fn is_emoji_only(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| is_emoji_char(c) || is_emoji_modifier(c))
        && text.chars().any(is_emoji_char)
}

/// Truncate the quoted fragment to the resolver's limit, on a char boundary
fn truncate_fragment(fragment: &str) -> String {
    fragment.chars().take(MAX_FRAGMENT_CHARS).collect()
}

/// Detect whether inbound text is a reaction phrase.
///
/// Returns `None` when the text is a new broadcast. The input is expected
/// to be trimmed already.
pub fn detect_reaction(text: &str) -> Option<DetectedReaction> {
    // Form 1: verb + quoted fragment
    if let Some(caps) = VERB_QUOTE_RE.captures(text) {
        if let Some(emoji) = verb_emoji(&caps[1]) {
            return Some(DetectedReaction {
                emoji: emoji.to_string(),
                target_fragment: truncate_fragment(&caps[2]),
                raw_pattern: "verb-quote",
            });
        }
    }

    // Form 2: "Reacted <emoji> to <quoted>"
    if let Some(caps) = REACTED_TO_RE.captures(text) {
        let token = &caps[1];
        if is_emoji_only(token) {
            return Some(DetectedReaction {
                emoji: token.to_string(),
                target_fragment: truncate_fragment(&caps[2]),
                raw_pattern: "reacted-emoji-quote",
            });
        }
    }

    // Form 3: bare emoji, nothing else (whitespace between emoji allowed)
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if is_emoji_only(&compact) {
        return Some(DetectedReaction {
            emoji: compact,
            target_fragment: String::new(),
            raw_pattern: "bare-emoji",
        });
    }

    // Form 4: "<emoji> to <quoted>"
    if let Some(caps) = EMOJI_TO_RE.captures(text) {
        let token = &caps[1];
        if is_emoji_only(token) {
            return Some(DetectedReaction {
                emoji: token.to_string(),
                target_fragment: truncate_fragment(&caps[2]),
                raw_pattern: "emoji-quote",
            });
        }
    }

    None
}
