//! Connection liveness lookup.
//!
//! The transport owns connection identities; the core only ever asks
//! whether one is still live. A negative answer marks the identity as
//! stale: it is discarded where encountered and never retried.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::identifiers::ConnectionId;

// ============================================================================
// Liveness
// ============================================================================

/// Answers whether a connection still has an active transport session.
///
/// Implementations must be side-effect free.
pub trait Liveness {
    /// Returns `true` iff the transport still has a session for `id`.
    fn is_live(&self, id: ConnectionId) -> bool;
}

impl<T: Liveness + ?Sized> Liveness for Arc<T> {
    #[inline]
    fn is_live(&self, id: ConnectionId) -> bool {
        (**self).is_live(id)
    }
}

impl<T: Liveness + ?Sized> Liveness for &T {
    #[inline]
    fn is_live(&self, id: ConnectionId) -> bool {
        (**self).is_live(id)
    }
}

// ============================================================================
// LiveSet
// ============================================================================

/// In-memory liveness set.
///
/// Cloning shares the underlying set, so one handle can be given to a
/// controller while another marks identities live or dead. Used when
/// driving the core without a socket transport.
#[derive(Debug, Clone, Default)]
pub struct LiveSet {
    live: Arc<RwLock<FxHashSet<ConnectionId>>>,
}

impl LiveSet {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as live.
    pub fn insert(&self, id: ConnectionId) {
        self.live.write().insert(id);
    }

    /// Marks `id` as gone. Returns `true` if it was live.
    pub fn remove(&self, id: ConnectionId) -> bool {
        self.live.write().remove(&id)
    }

    /// Returns the number of live identities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.read().len()
    }

    /// Returns `true` if no identity is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.read().is_empty()
    }
}

impl Liveness for LiveSet {
    #[inline]
    fn is_live(&self, id: ConnectionId) -> bool {
        self.live.read().contains(&id)
    }
}

// ============================================================================
// Tests
// ============================================================================
