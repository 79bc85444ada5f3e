//! Session lifecycle controller.
//!
//! Entry point of the core. Every inbound event for a connection is applied
//! here, against the [`Matchmaker`] and the connection's rate-limit
//! window, and answered with the [`Effect`]s to perform.
//!
//! The controller assumes exclusive access: callers serialize every
//! operation through one owner (see `transport::hub`).

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::ChatConfig;
use crate::identifiers::{ConnectionId, ResetToken};
use crate::protocol::{ClientCommand, ServerEvent};

use super::effect::Effect;
use super::matchmaker::{Matchmaker, SessionState};
use super::rate_limit::{RateDecision, RateLimiter, RateWindow};
use super::registry::Liveness;
use super::relay;
use super::sanitize::{ProfanityFilter, Sanitizer};

// ============================================================================
// ConnectionRecord
// ============================================================================

/// Core-side state owned by one connection.
#[derive(Debug, Default)]
struct ConnectionRecord {
    window: RateWindow,
}

// ============================================================================
// Controller
// ============================================================================

/// Drives connections through idle, waiting and paired.
pub struct Controller<R> {
    /// Transport liveness.
    registry: R,
    /// Pool and pairing table.
    engine: Matchmaker,
    /// Records of connected identities, removed on disconnect.
    connections: FxHashMap<ConnectionId, ConnectionRecord>,
    /// Shared rate limit.
    limiter: RateLimiter,
    /// Truncation length.
    max_message_len: usize,
    /// Text filter collaborator.
    sanitizer: Box<dyn Sanitizer>,
    /// Next reset token generation.
    next_token: u64,
}

impl<R: Liveness> Controller<R> {
    /// Creates a controller with the default profanity filter.
    #[must_use]
    pub fn new(registry: R, config: ChatConfig) -> Self {
        Self {
            registry,
            engine: Matchmaker::new(),
            connections: FxHashMap::default(),
            limiter: RateLimiter::from_config(&config),
            max_message_len: config.max_message_len,
            sanitizer: Box::new(ProfanityFilter::default()),
            next_token: 0,
        }
    }

    /// Replaces the text filter.
    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }
}

// ============================================================================
// Controller - Events
// ============================================================================

impl<R: Liveness> Controller<R> {
    /// Registers a new connection in the idle state.
    pub fn connect(&mut self, id: ConnectionId) -> Vec<Effect> {
        self.connections.entry(id).or_default();
        debug!(connection = %id, total = self.connections.len(), "Connection opened");
        Vec::new()
    }

    /// Applies a client command.
    pub fn handle(&mut self, id: ConnectionId, command: ClientCommand) -> Vec<Effect> {
        trace!(connection = %id, command = command.name(), "Handling command");

        match command {
            ClientCommand::RequestMatch => self.request_match(id),
            ClientCommand::SendMessage(raw) => self.send_message(id, &raw),
            ClientCommand::Skip => self.skip(id),
            ClientCommand::Leave => self.leave(id),
        }
    }

    /// Pairs `id` with a waiting connection or puts it in the pool.
    pub fn request_match(&mut self, id: ConnectionId) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.accepts(id) {
            self.engine.request_match(id, &self.registry, &mut effects);
        }
        effects
    }

    /// Relays a chat message from `sender` to its partner.
    ///
    /// Invalid text, a missing partner and a throttled sender all drop the
    /// message; only the throttle is reported back.
    pub fn send_message(&mut self, sender: ConnectionId, raw: &Value) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.accepts(sender) {
            return effects;
        }

        let Some(text) = relay::prepare_text(raw, self.max_message_len) else {
            trace!(connection = %sender, "Dropped invalid message");
            return effects;
        };

        let Some(partner) = self.engine.partner_of(sender) else {
            trace!(connection = %sender, "Dropped message without partner");
            return effects;
        };

        let Some(record) = self.connections.get_mut(&sender) else {
            return effects;
        };

        let next_token = &mut self.next_token;
        let decision = self.limiter.attempt(&mut record.window, || {
            *next_token += 1;
            ResetToken::new(*next_token)
        });

        match decision {
            RateDecision::Limited { retry_after } => {
                debug!(connection = %sender, count = record.window.count(), "Rate limited");
                effects.push(Effect::notify(sender, ServerEvent::RateLimited { retry_after }));
                return effects;
            }
            RateDecision::Allowed {
                schedule: Some(token),
            } => {
                effects.push(Effect::ScheduleReset {
                    connection: sender,
                    token,
                    after: self.limiter.window(),
                });
            }
            RateDecision::Allowed { schedule: None } => {}
        }

        let text = relay::sanitize_or_original(self.sanitizer.as_ref(), sender, text);

        if self.registry.is_live(partner) {
            effects.push(Effect::notify(
                partner,
                ServerEvent::Message {
                    text: text.clone(),
                    is_self: false,
                },
            ));
        }
        effects.push(Effect::notify(
            sender,
            ServerEvent::Message {
                text,
                is_self: true,
            },
        ));

        effects
    }

    /// Leaves the current partner and immediately looks for another.
    ///
    /// The former partner is notified and left idle; it is not requeued.
    pub fn skip(&mut self, id: ConnectionId) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.accepts(id) {
            return effects;
        }

        self.engine.unpair(id, true, &self.registry, &mut effects);
        self.engine.request_match(id, &self.registry, &mut effects);
        effects
    }

    /// Leaves the current partner or the pool and returns to idle.
    pub fn leave(&mut self, id: ConnectionId) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.accepts(id) {
            return effects;
        }

        self.engine.unpair(id, true, &self.registry, &mut effects);
        self.engine.withdraw(id);
        effects.push(Effect::notify(id, ServerEvent::Idle));
        effects
    }

    /// Destroys the connection.
    ///
    /// Cancels its pending window reset, removes it from the pool and ends
    /// its session, notifying the partner. Unknown identities are ignored,
    /// so a second disconnect is a no-op.
    pub fn disconnect(&mut self, id: ConnectionId) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(mut record) = self.connections.remove(&id) else {
            return effects;
        };

        if let Some(token) = record.window.cancel() {
            effects.push(Effect::CancelReset {
                connection: id,
                token,
            });
        }

        self.engine.withdraw(id);
        self.engine.unpair(id, true, &self.registry, &mut effects);

        debug!(connection = %id, total = self.connections.len(), "Connection closed");
        effects
    }

    /// Applies a fired window reset.
    ///
    /// Returns `false` if the connection is gone or the token is stale.
    pub fn window_elapsed(&mut self, id: ConnectionId, token: ResetToken) -> bool {
        let reset = self
            .connections
            .get_mut(&id)
            .is_some_and(|record| record.window.reset(token));

        trace!(connection = %id, %token, reset, "Rate window elapsed");
        reset
    }

    /// Returns `true` if commands from `id` should be processed.
    fn accepts(&self, id: ConnectionId) -> bool {
        let accepted = self.connections.contains_key(&id) && self.registry.is_live(id);
        if !accepted {
            trace!(connection = %id, "Ignored event from unknown or stale connection");
        }
        accepted
    }
}

// ============================================================================
// Controller - Inspection
// ============================================================================

impl<R> Controller<R> {
    /// Returns the state of `id`, or `None` if it is not connected.
    #[must_use]
    pub fn state(&self, id: ConnectionId) -> Option<SessionState> {
        self.connections
            .contains_key(&id)
            .then(|| self.engine.state(id))
    }

    /// Returns the partner of `id`.
    #[inline]
    #[must_use]
    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.engine.partner_of(id)
    }

    /// Messages counted in the current window of `id`.
    #[must_use]
    pub fn message_count(&self, id: ConnectionId) -> Option<u32> {
        self.connections.get(&id).map(|record| record.window.count())
    }

    /// Read access to the matchmaking engine.
    #[inline]
    #[must_use]
    pub const fn engine(&self) -> &Matchmaker {
        &self.engine
    }

    /// Number of connected identities.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
