//! Type-safe identifiers.
//!
//! Newtype wrappers keep connection identities and reset tokens from being
//! mixed up with each other or with plain integers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ConnectionId
// ============================================================================

/// Opaque identity of a transport session.
///
/// Assigned by the transport when a WebSocket is accepted and used by the
/// matchmaking core to reference the connection for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generates a fresh random identity.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ResetToken
// ============================================================================

/// Handle of a scheduled rate-limit window reset.
///
/// Tokens are unique per controller; a reset carrying a token that no
/// longer matches the connection's record is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResetToken(u64);

impl ResetToken {
    /// Creates a token from its raw generation number.
    #[inline]
    #[must_use]
    pub const fn new(generation: u64) -> Self {
        Self(generation)
    }

    /// Returns the raw generation number.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reset#{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
