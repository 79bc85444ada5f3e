//! Side effects requested by the core.
//!
//! Core operations never touch sockets or timers; they return a list of
//! [`Effect`]s which the hub applies in order.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::identifiers::{ConnectionId, ResetToken};
use crate::protocol::ServerEvent;

// ============================================================================
// Effect
// ============================================================================

/// One side effect to perform after a core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver `event` to `to`. Silently dropped if `to` is gone.
    Notify {
        /// Recipient.
        to: ConnectionId,
        /// Notification.
        event: ServerEvent,
    },

    /// Fire a window reset for `connection` after `after`.
    ScheduleReset {
        /// Owner of the rate-limit window.
        connection: ConnectionId,
        /// Token to hand back when the reset fires.
        token: ResetToken,
        /// Delay before firing.
        after: Duration,
    },

    /// Cancel a previously scheduled reset.
    CancelReset {
        /// Owner of the rate-limit window.
        connection: ConnectionId,
        /// Token of the reset to cancel.
        token: ResetToken,
    },
}

impl Effect {
    /// Creates a notification effect.
    #[inline]
    #[must_use]
    pub const fn notify(to: ConnectionId, event: ServerEvent) -> Self {
        Self::Notify { to, event }
    }

    /// Returns the notification if this is one.
    #[inline]
    #[must_use]
    pub fn as_notification(&self) -> Option<(ConnectionId, &ServerEvent)> {
        match self {
            Self::Notify { to, event } => Some((*to, event)),
            _ => None,
        }
    }
}
