//! Server and chat configuration.
//!
//! [`ChatConfig`] holds the limits the matchmaking core enforces;
//! [`ServerConfig`] adds the transport settings around it.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use orion_chat::{ChatConfig, ServerConfig};
//!
//! let config = ServerConfig::new()
//!     .with_port(8080)
//!     .with_chat(ChatConfig::new().with_rate_limit(20, Duration::from_secs(10)));
//! ```
//!
//! # Environment
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `HOST` | bind address | `0.0.0.0` |
//! | `PORT` | port | `3000` |
//! | `ORION_MAX_PAYLOAD` | max inbound frame bytes | `10000` |
//! | `ORION_MAX_MESSAGE_LEN` | max message characters | `500` |
//! | `ORION_RATE_LIMIT` | messages per window | `10` |
//! | `ORION_RATE_WINDOW_MS` | window length | `5000` |

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default maximum message length, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 500;

/// Default number of messages allowed per window.
pub const DEFAULT_RATE_LIMIT: u32 = 10;

/// Default rate-limit window.
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_millis(5000);

/// Default port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default cap on a single inbound WebSocket message (10 KB).
pub const DEFAULT_MAX_PAYLOAD: usize = 10_000;

/// Default bind address.
const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

// ============================================================================
// ChatConfig
// ============================================================================

/// Limits enforced by the matchmaking core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatConfig {
    /// Messages longer than this are truncated, not rejected.
    pub max_message_len: usize,

    /// Messages allowed per window.
    pub rate_limit: u32,

    /// Length of the fixed rate-limit window.
    pub rate_window: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatConfig {
    /// Creates a configuration with the default limits.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }

    /// Sets the maximum message length in characters.
    #[inline]
    #[must_use]
    pub const fn with_max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len;
        self
    }

    /// Sets the message budget and the window it applies to.
    #[inline]
    #[must_use]
    pub const fn with_rate_limit(mut self, limit: u32, window: Duration) -> Self {
        self.rate_limit = limit;
        self.rate_window = window;
        self
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

/// Transport configuration plus the chat limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to.
    pub ip: IpAddr,

    /// Port to bind to (0 for random).
    pub port: u16,

    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_payload: usize,

    /// Limits passed to the matchmaking core.
    pub chat: ChatConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    /// Creates a configuration with default values.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ip: DEFAULT_BIND_IP,
            port: DEFAULT_PORT,
            max_payload: DEFAULT_MAX_PAYLOAD,
            chat: ChatConfig::new(),
        }
    }

    /// Creates a configuration bound to `127.0.0.1` on a random port.
    ///
    /// Mostly useful in tests.
    #[inline]
    #[must_use]
    pub const fn localhost() -> Self {
        Self::new()
            .with_ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_port(0)
    }

    /// Reads the configuration from the environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new();

        if let Some(ip) = parse_var(&lookup, "HOST")? {
            config.ip = ip;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(max_payload) = parse_var(&lookup, "ORION_MAX_PAYLOAD")? {
            config.max_payload = max_payload;
        }
        if let Some(len) = parse_var(&lookup, "ORION_MAX_MESSAGE_LEN")? {
            config.chat.max_message_len = len;
        }
        if let Some(limit) = parse_var(&lookup, "ORION_RATE_LIMIT")? {
            config.chat.rate_limit = limit;
        }
        if let Some(millis) = parse_var::<u64>(&lookup, "ORION_RATE_WINDOW_MS")? {
            config.chat.rate_window = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the bind address.
    #[inline]
    #[must_use]
    pub const fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    /// Sets the port (0 for random).
    #[inline]
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the inbound payload cap in bytes.
    #[inline]
    #[must_use]
    pub const fn with_max_payload(mut self, bytes: usize) -> Self {
        self.max_payload = bytes;
        self
    }

    /// Sets the chat limits.
    #[inline]
    #[must_use]
    pub const fn with_chat(mut self, chat: ChatConfig) -> Self {
        self.chat = chat;
        self
    }

    /// Returns the socket address to bind.
    #[inline]
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    /// Checks that the values can actually run a server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero payload cap, message length,
    /// rate limit or window.
    pub fn validate(&self) -> Result<()> {
        if self.max_payload == 0 {
            return Err(Error::config("max payload must be greater than zero"));
        }
        if self.chat.max_message_len == 0 {
            return Err(Error::config("max message length must be greater than zero"));
        }
        if self.chat.rate_limit == 0 {
            return Err(Error::config("rate limit must be greater than zero"));
        }
        if self.chat.rate_window.is_zero() {
            return Err(Error::config("rate window must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parses an optional variable, reporting the key on failure.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| Error::config(format!("{key}={raw:?}: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
