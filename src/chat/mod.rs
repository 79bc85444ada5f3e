//! Matchmaking and session-lifecycle core.
//!
//! Pure, synchronous state machine: no sockets, no timers. Operations
//! return [`Effect`]s which the transport applies.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Liveness`] | Transport liveness lookup |
//! | [`RateLimiter`] | Fixed-window message throttle |
//! | [`WaitingPool`] | FIFO pool of connections seeking a partner |
//! | [`PairingTable`] | Symmetric one-to-one session map |
//! | [`Matchmaker`] | Pool and table kept mutually exclusive |
//! | [`Controller`] | Per-event state transitions |
//!
//! # Example
//!
//! ```ignore
//! use orion_chat::chat::{Controller, LiveSet};
//! use orion_chat::{ChatConfig, ConnectionId};
//!
//! let registry = LiveSet::new();
//! let mut controller = Controller::new(registry.clone(), ChatConfig::default());
//!
//! let a = ConnectionId::generate();
//! registry.insert(a);
//! controller.connect(a);
//! let effects = controller.request_match(a); // [Notify { to: a, event: Waiting }]
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Side effects requested by the core.
pub mod effect;

/// Session lifecycle controller.
pub mod lifecycle;

/// Matchmaking engine.
pub mod matchmaker;

/// Symmetric session map.
pub mod pairing;

/// Per-connection message throttle.
pub mod rate_limit;

/// Connection liveness lookup.
pub mod registry;

/// Message validation and fail-open sanitizing.
pub mod relay;

/// Pluggable text filters.
pub mod sanitize;

/// FIFO waiting pool.
pub mod waiting_pool;

// ============================================================================
// Re-exports
// ============================================================================

pub use effect::Effect;
pub use lifecycle::Controller;
pub use matchmaker::{MatchOutcome, Matchmaker, SessionState};
pub use pairing::PairingTable;
pub use rate_limit::{RateDecision, RateLimiter, RateWindow};
pub use registry::{LiveSet, Liveness};
pub use sanitize::{PassThrough, ProfanityFilter, Sanitizer};
pub use waiting_pool::WaitingPool;
