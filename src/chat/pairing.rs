//! Symmetric one-to-one session map.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

use crate::identifiers::ConnectionId;

// ============================================================================
// PairingTable
// ============================================================================

/// Maps each paired connection to its partner.
///
/// Every entry `a ↦ b` has a mirror `b ↦ a`, and no connection maps to
/// itself.
#[derive(Debug, Default)]
pub struct PairingTable {
    partners: FxHashMap<ConnectionId, ConnectionId>,
}

impl PairingTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `a` with `b`.
    ///
    /// Returns `false` and leaves the table untouched if `a == b` or either
    /// side is already paired.
    pub fn pair(&mut self, a: ConnectionId, b: ConnectionId) -> bool {
        if a == b || self.partners.contains_key(&a) || self.partners.contains_key(&b) {
            return false;
        }
        self.partners.insert(a, b);
        self.partners.insert(b, a);
        true
    }

    /// Removes the pairing containing `id` and returns the former partner.
    ///
    /// `None` if `id` was not paired.
    pub fn unpair(&mut self, id: ConnectionId) -> Option<ConnectionId> {
        let partner = self.partners.remove(&id)?;
        self.partners.remove(&partner);
        Some(partner)
    }

    /// Returns the partner of `id`.
    #[inline]
    #[must_use]
    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.partners.get(&id).copied()
    }

    /// Returns `true` if `id` is paired.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.partners.contains_key(&id)
    }

    /// Number of paired connections (twice the number of sessions).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    /// Returns `true` if nobody is paired.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    /// Iterates `(connection, partner)` entries, both directions included.
    pub fn iter(&self) -> impl Iterator<Item = (ConnectionId, ConnectionId)> + '_ {
        self.partners.iter().map(|(a, b)| (*a, *b))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_is_symmetric() {
        let mut table = PairingTable::new();
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        assert!(table.pair(a, b));
        assert_eq!(table.partner_of(a), Some(b));
        assert_eq!(table.partner_of(b), Some(a));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_refuses_self_pairing() {
        let mut table = PairingTable::new();
        let a = ConnectionId::generate();

        assert!(!table.pair(a, a));
        assert!(table.is_empty());
    }

    #[test]
    fn test_refuses_double_pairing() {
        let mut table = PairingTable::new();
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        let c = ConnectionId::generate();
        table.pair(a, b);

        assert!(!table.pair(c, a));
        assert!(!table.pair(b, c));
        assert_eq!(table.partner_of(a), Some(b));
        assert!(!table.contains(c));
    }

    #[test]
    fn test_unpair_removes_both_sides() {
        let mut table = PairingTable::new();
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        table.pair(a, b);

        assert_eq!(table.unpair(b), Some(a));
        assert!(table.is_empty());
        assert_eq!(table.unpair(a), None);
    }
}
