//! Inbound user actions.
//!
//! | Event | Payload |
//! |-------|---------|
//! | `request-match` (alias `find-partner`) | none |
//! | `send-message` | any JSON value, only strings are relayed |
//! | `skip` | none |
//! | `leave` (alias `leave-chat`) | none |
//!
//! Disconnects are not frames; the transport reports them when the socket
//! closes.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// ClientCommand
// ============================================================================

/// An action requested by a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    /// Ask to be paired with a stranger.
    #[serde(rename = "request-match", alias = "find-partner")]
    RequestMatch,

    /// Send a chat message to the current partner.
    ///
    /// The payload is kept as a raw value; non-string payloads are dropped
    /// by the relay rather than rejected at decode time.
    #[serde(rename = "send-message")]
    SendMessage(Value),

    /// Leave the current partner and look for a new one.
    #[serde(rename = "skip")]
    Skip,

    /// Leave the current partner (or the waiting pool) and go idle.
    #[serde(rename = "leave", alias = "leave-chat")]
    Leave,
}

impl ClientCommand {
    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not JSON
    /// - [`Error::Protocol`] if it is JSON but not a known command
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            if e.is_data() {
                Error::protocol(e.to_string())
            } else {
                Error::Json(e)
            }
        })
    }

    /// Returns the wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RequestMatch => "request-match",
            Self::SendMessage(_) => "send-message",
            Self::Skip => "skip",
            Self::Leave => "leave",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
