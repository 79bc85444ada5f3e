//! Pluggable text filters.
//!
//! Sanitizing is best effort: the relay delivers the unfiltered text when
//! a [`Sanitizer`] fails.

// ============================================================================
// Imports
// ============================================================================

use regex::{Captures, Regex, RegexBuilder};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Words masked by [`ProfanityFilter::default`].
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "arse", "ass", "asshole", "bastard", "bitch", "bollocks", "crap", "cunt", "damn", "dick",
    "fuck", "fucker", "fucking", "motherfucker", "piss", "prick", "shit", "slut", "twat", "wanker",
    "whore",
];

/// Character replacing each masked letter.
const MASK: char = '*';

// ============================================================================
// Sanitizer
// ============================================================================

/// Text-to-text filter applied to every relayed message.
pub trait Sanitizer: Send + Sync {
    /// Returns the filtered text.
    ///
    /// # Errors
    ///
    /// Any error makes the relay fall back to the original text.
    fn sanitize(&self, text: &str) -> Result<String>;
}

// ============================================================================
// PassThrough
// ============================================================================

/// Returns text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Sanitizer for PassThrough {
    fn sanitize(&self, text: &str) -> Result<String> {
        Ok(text.to_owned())
    }
}

// ============================================================================
// ProfanityFilter
// ============================================================================

/// Masks blocklisted words, matched whole-word and case-insensitively.
///
/// Every letter of a match becomes `*`, so `"oh Shit"` turns into
/// `"oh ****"`.
#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    pattern: Option<Regex>,
}

impl ProfanityFilter {
    /// Builds a filter for the given words.
    ///
    /// An empty list yields a filter that changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sanitize`] if the compiled pattern exceeds the
    /// regex size limit.
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternation = words
            .into_iter()
            .map(|word| regex::escape(word.as_ref().trim()))
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join("|");

        if alternation.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::sanitize(format!("invalid blocklist: {e}")))?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }
}

impl Default for ProfanityFilter {
    fn default() -> Self {
        // The built-in list is small and escaped; compilation cannot hit
        // the size limit.
        Self::new(DEFAULT_BLOCKLIST).unwrap_or(Self { pattern: None })
    }
}

impl Sanitizer for ProfanityFilter {
    fn sanitize(&self, text: &str) -> Result<String> {
        let Some(pattern) = &self.pattern else {
            return Ok(text.to_owned());
        };

        let masked = pattern.replace_all(text, |caps: &Captures<'_>| {
            MASK.to_string().repeat(caps[0].chars().count())
        });
        Ok(masked.into_owned())
    }
}

// ============================================================================
// Tests
// ============================================================================
