//! Registry of live client connections.
//!
//! The pool is the transport's answer to "is this identity still
//! connected?" and the delivery point for notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           ConnectionPool                │
//! │  ┌─────────────────────────────────┐    │
//! │  │ ConnectionId(a1f…) → Connection │    │
//! │  │ ConnectionId(7c0…) → Connection │    │
//! │  │ ConnectionId(e42…) → Connection │    │
//! │  └─────────────────────────────────┘    │
//! └─────────────────────────────────────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info, trace};

use crate::chat::Liveness;
use crate::identifiers::ConnectionId;
use crate::protocol::ServerEvent;

use super::Connection;

// ============================================================================
// ConnectionPool
// ============================================================================

/// Live connections keyed by [`ConnectionId`].
///
/// Thread-safe; read by the hub for every notification and written by the
/// accept loop and the per-socket event loops.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Active connections by identity.
    connections: RwLock<FxHashMap<ConnectionId, Connection>>,
}

// ============================================================================
// ConnectionPool - Public API
// ============================================================================

impl ConnectionPool {
    /// Creates an empty pool.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live connections.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Delivers `event` to `id`.
    ///
    /// Silently does nothing and returns `false` if `id` is not live.
    pub fn notify(&self, id: ConnectionId, event: ServerEvent) -> bool {
        let connection = {
            let connections = self.connections.read();
            connections.get(&id).cloned()
        };

        match connection {
            Some(connection) => connection.send(event),
            None => {
                trace!(connection = %id, event = event.name(), "Dropped event for stale connection");
                false
            }
        }
    }
}

// ============================================================================
// ConnectionPool - Lifecycle
// ============================================================================

impl ConnectionPool {
    /// Adds a connection.
    pub fn insert(&self, connection: Connection) {
        let id = connection.id();
        self.connections.write().insert(id, connection);
        debug!(connection = %id, "Connection added to pool");
    }

    /// Removes a connection. Does not close its socket.
    pub fn remove(&self, id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.write().remove(&id);
        if removed.is_some() {
            debug!(connection = %id, "Connection removed from pool");
        }
        removed
    }

    /// Removes every connection and asks each socket to close.
    pub fn shutdown_all(&self) {
        let connections: Vec<_> = {
            let mut map = self.connections.write();
            map.drain().collect()
        };

        let count = connections.len();
        for (_, connection) in connections {
            connection.shutdown();
        }

        info!(count, "Closed all connections");
    }
}

impl Liveness for ConnectionPool {
    #[inline]
    fn is_live(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }
}

// ============================================================================
// Tests
// ============================================================================
