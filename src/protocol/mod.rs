//! WebSocket protocol message types.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`. Payload-less events omit
//! `data` entirely.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`ClientCommand`] | Client → Server | User action |
//! | [`ServerEvent`] | Server → Client | Notification |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Inbound user actions |
//! | `event` | Outbound notifications |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound user actions.
pub mod command;

/// Outbound notifications.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::ClientCommand;
pub use event::ServerEvent;
