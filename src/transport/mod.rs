//! WebSocket transport layer.
//!
//! Accepts clients, turns their frames into hub commands, and delivers the
//! hub's notifications back to the sockets.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   WebSocket   ┌────────────┐  HubCommand  ┌─────┐
//! │ Client A │◄─────────────►│ Connection │─────────────►│     │
//! └──────────┘               └────────────┘              │ Hub │
//! ┌──────────┐   WebSocket   ┌────────────┐  HubCommand  │     │
//! │ Client B │◄─────────────►│ Connection │─────────────►│     │
//! └──────────┘               └─────▲──────┘              └──┬──┘
//!                                  │      ConnectionPool    │
//!                                  └────────── notify ◄─────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `ChatServer` accepts and upgrades the TCP stream
//! 2. The `Connection` is inserted in the `ConnectionPool`, the hub is told
//! 3. Frames flow until close, error or shutdown
//! 4. The connection leaves the pool, then the hub processes the disconnect
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Per-socket handle and event loop |
//! | `hub` | Single owner of the matchmaking state |
//! | `pool` | Registry of live connections |
//! | `server` | Listener and accept loop |

// ============================================================================
// Submodules
// ============================================================================

/// Per-socket handle and event loop.
pub mod connection;

/// Single owner of the matchmaking state.
pub mod hub;

/// Registry of live connections.
pub mod pool;

/// Listener and accept loop.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use hub::{Hub, HubHandle};
pub use pool::ConnectionPool;
pub use server::ChatServer;
