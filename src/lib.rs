//! Orion Chat - anonymous one-on-one WebSocket chat.
//!
//! Pairs strangers into private text sessions, relays their messages and
//! throttles each connection.
//!
//! # Architecture
//!
//! The crate is split into a pure core and the transport around it:
//!
//! - **Core ([`chat`])**: waiting pool, pairing table, rate limiter and
//!   the lifecycle controller. Synchronous; every operation returns the
//!   effects to perform.
//! - **Transport ([`transport`])**: WebSocket server, per-socket event
//!   loops, and the hub task that owns the core.
//!
//! Key design principles:
//!
//! - One owner for all matchmaking state (no fine-grained locks)
//! - A connection is never both waiting and paired
//! - Sanitizing fails open, throttled messages are dropped, not queued
//!
//! # Quick Start
//!
//! ```no_run
//! use orion_chat::{ChatServer, Result, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let server = ChatServer::bind(ServerConfig::from_env()?).await?;
//!     println!("Listening on {}", server.ws_url());
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`chat`] | Matchmaking and session-lifecycle core |
//! | [`config`] | Server and chat limits |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | WebSocket message types |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Matchmaking and session-lifecycle core.
///
/// - [`chat::Controller`] - applies events, returns effects
/// - [`chat::Matchmaker`] - waiting pool plus pairing table
/// - [`chat::RateLimiter`] - fixed-window throttle
pub mod chat;

/// Server and chat configuration.
pub mod config;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// WebSocket protocol message types.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Core types
pub use chat::{Controller, Effect, LiveSet, Liveness, SessionState};

// Configuration
pub use config::{ChatConfig, ServerConfig};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, ResetToken};

// Protocol types
pub use protocol::{ClientCommand, ServerEvent};

// Transport types
pub use transport::ChatServer;
