//! Message validation, truncation and fail-open sanitizing.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::warn;

use crate::identifiers::ConnectionId;

use super::sanitize::Sanitizer;

// ============================================================================
// Functions
// ============================================================================

/// Extracts the text to relay from a raw payload.
///
/// Returns `None` for non-string payloads and for text that is empty after
/// trimming whitespace and byte-order marks. Longer text is cut to
/// `max_len` characters, never rejected.
///
/// Length is counted in Unicode scalar values (`char`s), not UTF-16 code
/// units, so an emoji outside the BMP counts once.
#[must_use]
pub fn prepare_text(raw: &Value, max_len: usize) -> Option<String> {
    let trimmed = raw
        .as_str()?
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}');
    if trimmed.is_empty() {
        return None;
    }

    let text = match trimmed.char_indices().nth(max_len) {
        Some((cut, _)) => &trimmed[..cut],
        None => trimmed,
    };
    Some(text.to_owned())
}

/// Runs `text` through `sanitizer`, falling back to `text` on failure.
#[must_use]
pub fn sanitize_or_original(
    sanitizer: &dyn Sanitizer,
    sender: ConnectionId,
    text: String,
) -> String {
    match sanitizer.sanitize(&text) {
        Ok(clean) => clean,
        Err(e) => {
            warn!(connection = %sender, error = %e, "Sanitizer failed, delivering unfiltered text");
            text
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
