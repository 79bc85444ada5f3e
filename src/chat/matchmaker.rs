//! Matchmaking engine.
//!
//! Owns the [`WaitingPool`] and the [`PairingTable`] together so that a
//! connection is never waiting and paired at the same time.
//!
//! ```text
//!           request_match                  matched
//!   Idle ─────────────────► Waiting ─────────────────► Paired
//!    ▲   (no candidate)                                  │
//!    └───────────── partner skipped / left / gone ──────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::identifiers::ConnectionId;
use crate::protocol::ServerEvent;

use super::effect::Effect;
use super::pairing::PairingTable;
use super::registry::Liveness;
use super::waiting_pool::WaitingPool;

// ============================================================================
// SessionState
// ============================================================================

/// Logical state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Neither waiting nor paired.
    Idle,
    /// In the waiting pool.
    Waiting,
    /// In the pairing table.
    Paired,
}

// ============================================================================
// MatchOutcome
// ============================================================================

/// Result of [`Matchmaker::request_match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Already waiting or paired; nothing changed.
    Ignored,
    /// Paired with the contained connection.
    Paired(ConnectionId),
    /// No candidate; now waiting.
    Waiting,
}

// ============================================================================
// Matchmaker
// ============================================================================

/// Waiting pool plus pairing table.
#[derive(Debug, Default)]
pub struct Matchmaker {
    pool: WaitingPool,
    pairs: PairingTable,
}

impl Matchmaker {
    /// Creates an empty engine.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `id` with the longest-waiting live connection, or enqueues it.
    ///
    /// Emits `partner-found` to both sides on a match and `waiting` to
    /// `id` otherwise. A request from a connection that is already waiting
    /// or paired is ignored.
    pub fn request_match(
        &mut self,
        id: ConnectionId,
        registry: &impl Liveness,
        effects: &mut Vec<Effect>,
    ) -> MatchOutcome {
        if self.pairs.contains(id) || self.pool.contains(id) {
            debug!(connection = %id, "Duplicate match request ignored");
            return MatchOutcome::Ignored;
        }

        if let Some(candidate) = self.pool.take_next_eligible(id, registry) {
            self.pairs.pair(id, candidate);
            effects.push(Effect::notify(id, ServerEvent::PartnerFound));
            effects.push(Effect::notify(candidate, ServerEvent::PartnerFound));
            debug!(connection = %id, partner = %candidate, "Paired");
            return MatchOutcome::Paired(candidate);
        }

        self.pool.enqueue(id);
        effects.push(Effect::notify(id, ServerEvent::Waiting));
        debug!(connection = %id, waiting = self.pool.len(), "Waiting for partner");
        MatchOutcome::Waiting
    }

    /// Ends the session of `id`, if any, and returns the former partner.
    ///
    /// With `notify`, a live partner receives exactly one
    /// `partner-disconnected`.
    pub fn unpair(
        &mut self,
        id: ConnectionId,
        notify: bool,
        registry: &impl Liveness,
        effects: &mut Vec<Effect>,
    ) -> Option<ConnectionId> {
        let partner = self.pairs.unpair(id)?;

        if notify && registry.is_live(partner) {
            effects.push(Effect::notify(partner, ServerEvent::PartnerDisconnected));
        }

        debug!(connection = %id, partner = %partner, "Unpaired");
        Some(partner)
    }

    /// Removes `id` from the waiting pool. Returns `true` if it was waiting.
    #[inline]
    pub fn withdraw(&mut self, id: ConnectionId) -> bool {
        self.pool.remove(id)
    }

    /// Returns the logical state of `id`.
    #[must_use]
    pub fn state(&self, id: ConnectionId) -> SessionState {
        if self.pairs.contains(id) {
            SessionState::Paired
        } else if self.pool.contains(id) {
            SessionState::Waiting
        } else {
            SessionState::Idle
        }
    }

    /// Returns the partner of `id`.
    #[inline]
    #[must_use]
    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.pairs.partner_of(id)
    }

    /// Read access to the waiting pool.
    #[inline]
    #[must_use]
    pub const fn pool(&self) -> &WaitingPool {
        &self.pool
    }

    /// Read access to the pairing table.
    #[inline]
    #[must_use]
    pub const fn pairs(&self) -> &PairingTable {
        &self.pairs
    }

    /// Checks the structural invariants.
    ///
    /// Pairing is symmetric and irreflexive, and no connection is both
    /// waiting and paired.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let symmetric = self
            .pairs
            .iter()
            .all(|(a, b)| a != b && self.pairs.partner_of(b) == Some(a));
        let disjoint = self.pool.iter().all(|id| !self.pairs.contains(id));
        symmetric && disjoint
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::chat::registry::LiveSet;

    fn setup(count: usize) -> (Matchmaker, LiveSet, Vec<ConnectionId>) {
        let registry = LiveSet::new();
        let ids = (0..count)
            .map(|_| {
                let id = ConnectionId::generate();
                registry.insert(id);
                id
            })
            .collect();
        (Matchmaker::new(), registry, ids)
    }

    #[test]
    fn test_first_request_waits() {
        let (mut engine, registry, ids) = setup(1);
        let mut effects = Vec::new();

        let outcome = engine.request_match(ids[0], &registry, &mut effects);

        assert_eq!(outcome, MatchOutcome::Waiting);
        assert_eq!(effects, vec![Effect::notify(ids[0], ServerEvent::Waiting)]);
        assert_eq!(engine.state(ids[0]), SessionState::Waiting);
    }

    #[test]
    fn test_second_request_pairs_both() {
        let (mut engine, registry, ids) = setup(2);
        let mut effects = Vec::new();
        engine.request_match(ids[0], &registry, &mut effects);
        effects.clear();

        let outcome = engine.request_match(ids[1], &registry, &mut effects);

        assert_eq!(outcome, MatchOutcome::Paired(ids[0]));
        assert_eq!(
            effects,
            vec![
                Effect::notify(ids[1], ServerEvent::PartnerFound),
                Effect::notify(ids[0], ServerEvent::PartnerFound),
            ]
        );
        assert_eq!(engine.partner_of(ids[0]), Some(ids[1]));
        assert_eq!(engine.partner_of(ids[1]), Some(ids[0]));
        assert!(engine.pool().is_empty());
        assert!(engine.is_consistent());
    }

    #[test]
    fn test_duplicate_request_is_ignored() {
        let (mut engine, registry, ids) = setup(1);
        let mut effects = Vec::new();
        engine.request_match(ids[0], &registry, &mut effects);
        let outcome = engine.request_match(ids[0], &registry, &mut effects);

        assert_eq!(outcome, MatchOutcome::Ignored);
        assert_eq!(effects.len(), 1);
        assert_eq!(engine.pool().len(), 1);
    }

    #[test]
    fn test_request_while_paired_is_ignored() {
        let (mut engine, registry, ids) = setup(3);
        let mut effects = Vec::new();
        engine.request_match(ids[0], &registry, &mut effects);
        engine.request_match(ids[1], &registry, &mut effects);
        engine.request_match(ids[2], &registry, &mut effects);
        effects.clear();

        assert_eq!(
            engine.request_match(ids[0], &registry, &mut effects),
            MatchOutcome::Ignored
        );
        assert!(effects.is_empty());
        assert_eq!(engine.state(ids[2]), SessionState::Waiting);
    }

    #[test]
    fn test_stale_candidate_is_skipped() {
        let (mut engine, registry, ids) = setup(3);
        let mut effects = Vec::new();
        engine.request_match(ids[0], &registry, &mut effects);
        registry.remove(ids[0]);
        engine.request_match(ids[1], &registry, &mut effects);

        // ids[0] was evicted while ids[1] scanned, so ids[1] is now waiting.
        assert_eq!(engine.state(ids[0]), SessionState::Idle);
        assert_eq!(engine.state(ids[1]), SessionState::Waiting);

        assert_eq!(
            engine.request_match(ids[2], &registry, &mut effects),
            MatchOutcome::Paired(ids[1])
        );
    }

    #[test]
    fn test_unpair_notifies_live_partner_once() {
        let (mut engine, registry, ids) = setup(2);
        let mut effects = Vec::new();
        engine.request_match(ids[0], &registry, &mut effects);
        engine.request_match(ids[1], &registry, &mut effects);
        effects.clear();

        assert_eq!(engine.unpair(ids[0], true, &registry, &mut effects), Some(ids[1]));
        assert_eq!(engine.unpair(ids[0], true, &registry, &mut effects), None);
        assert_eq!(
            effects,
            vec![Effect::notify(ids[1], ServerEvent::PartnerDisconnected)]
        );
        assert!(engine.pairs().is_empty());
    }

    #[test]
    fn test_unpair_skips_dead_partner() {
        let (mut engine, registry, ids) = setup(2);
        let mut effects = Vec::new();
        engine.request_match(ids[0], &registry, &mut effects);
        engine.request_match(ids[1], &registry, &mut effects);
        effects.clear();
        registry.remove(ids[1]);

        engine.unpair(ids[0], true, &registry, &mut effects);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_unpair_without_notify() {
        let (mut engine, registry, ids) = setup(2);
        let mut effects = Vec::new();
        engine.request_match(ids[0], &registry, &mut effects);
        engine.request_match(ids[1], &registry, &mut effects);
        effects.clear();

        engine.unpair(ids[1], false, &registry, &mut effects);
        assert!(effects.is_empty());
        assert_eq!(engine.state(ids[0]), SessionState::Idle);
    }
}
