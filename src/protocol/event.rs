//! Outbound notifications.
//!
//! | Event | Payload |
//! |-------|---------|
//! | `waiting` | none |
//! | `partner-found` | none |
//! | `message` | `{ "text": string, "self": bool }` |
//! | `partner-disconnected` | none |
//! | `rate-limited` | `{ "retryAfter": milliseconds }` |
//! | `idle` | none |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// ServerEvent
// ============================================================================

/// A notification sent to one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Enqueued in the waiting pool, no partner yet.
    Waiting,

    /// Paired with a partner. Sent to both sides.
    PartnerFound,

    /// A delivered chat message.
    Message {
        /// Sanitized message text.
        text: String,
        /// `true` on the echo sent back to the author.
        #[serde(rename = "self")]
        is_self: bool,
    },

    /// The former partner skipped, left, or disconnected.
    PartnerDisconnected,

    /// The message was dropped by the per-connection throttle.
    RateLimited {
        /// Suggested delay before sending again.
        #[serde(rename = "retryAfter", with = "duration_ms")]
        retry_after: Duration,
    },

    /// Confirms the return to idle after a leave.
    Idle,
}

impl ServerEvent {
    /// Encodes the event as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::PartnerFound => "partner-found",
            Self::Message { .. } => "message",
            Self::PartnerDisconnected => "partner-disconnected",
            Self::RateLimited { .. } => "rate-limited",
            Self::Idle => "idle",
        }
    }
}

// ============================================================================
// Duration Encoding
// ============================================================================

/// Serializes a [`Duration`] as whole milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================
