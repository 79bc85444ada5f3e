//! FIFO pool of connections waiting for a partner.
//!
//! Entries for connections that went away are not swept proactively;
//! they are evicted when a scan walks past them.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::identifiers::ConnectionId;

use super::registry::Liveness;

// ============================================================================
// WaitingPool
// ============================================================================

/// Ordered set of connections seeking a partner.
#[derive(Debug, Default)]
pub struct WaitingPool {
    /// Insertion order.
    queue: VecDeque<ConnectionId>,
    /// Membership, mirrors `queue`.
    members: FxHashSet<ConnectionId>,
}

impl WaitingPool {
    /// Creates an empty pool.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id`. Returns `false` if it was already waiting.
    pub fn enqueue(&mut self, id: ConnectionId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.queue.push_back(id);
        true
    }

    /// Removes `id`. Returns `true` if it was waiting.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        self.queue.retain(|queued| *queued != id);
        true
    }

    /// Returns `true` if `id` is waiting.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.members.contains(&id)
    }

    /// Number of entries, stale ones included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nobody is waiting.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.queue.iter().copied()
    }

    /// Removes and returns the longest-waiting live entry other than
    /// `excluding`.
    ///
    /// Entries that are no longer live are evicted as the scan reaches
    /// them. `excluding` keeps its place in the pool.
    pub fn take_next_eligible(
        &mut self,
        excluding: ConnectionId,
        registry: &impl Liveness,
    ) -> Option<ConnectionId> {
        let mut index = 0;

        while let Some(&candidate) = self.queue.get(index) {
            if !registry.is_live(candidate) {
                self.queue.remove(index);
                self.members.remove(&candidate);
                trace!(connection = %candidate, "Evicted stale pool entry");
                continue;
            }

            if candidate == excluding {
                index += 1;
                continue;
            }

            self.queue.remove(index);
            self.members.remove(&candidate);
            return Some(candidate);
        }

        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::chat::registry::LiveSet;

    fn live(count: usize) -> (LiveSet, Vec<ConnectionId>) {
        let set = LiveSet::new();
        let ids = (0..count)
            .map(|_| {
                let id = ConnectionId::generate();
                set.insert(id);
                id
            })
            .collect();
        (set, ids)
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut pool = WaitingPool::new();
        let id = ConnectionId::generate();

        assert!(pool.enqueue(id));
        assert!(!pool.enqueue(id));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_takes_in_fifo_order() {
        let (set, ids) = live(3);
        let mut pool = WaitingPool::new();
        for id in &ids {
            pool.enqueue(*id);
        }
        let requester = ConnectionId::generate();

        assert_eq!(pool.take_next_eligible(requester, &set), Some(ids[0]));
        assert_eq!(pool.take_next_eligible(requester, &set), Some(ids[1]));
        assert_eq!(pool.take_next_eligible(requester, &set), Some(ids[2]));
        assert_eq!(pool.take_next_eligible(requester, &set), None);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_never_returns_excluded_id() {
        let (set, ids) = live(1);
        let mut pool = WaitingPool::new();
        pool.enqueue(ids[0]);

        assert_eq!(pool.take_next_eligible(ids[0], &set), None);
        assert!(pool.contains(ids[0]));
    }

    #[test]
    fn test_skips_excluded_and_keeps_its_position() {
        let (set, ids) = live(2);
        let mut pool = WaitingPool::new();
        pool.enqueue(ids[0]);
        pool.enqueue(ids[1]);

        assert_eq!(pool.take_next_eligible(ids[0], &set), Some(ids[1]));
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec![ids[0]]);
    }

    #[test]
    fn test_evicts_stale_entries_during_scan() {
        let (set, ids) = live(3);
        let mut pool = WaitingPool::new();
        for id in &ids {
            pool.enqueue(*id);
        }
        set.remove(ids[0]);
        set.remove(ids[1]);

        let requester = ConnectionId::generate();
        assert_eq!(pool.take_next_eligible(requester, &set), Some(ids[2]));
        assert!(!pool.contains(ids[0]));
        assert!(!pool.contains(ids[1]));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_stale_entries_behind_match_are_untouched() {
        let (set, ids) = live(2);
        let mut pool = WaitingPool::new();
        pool.enqueue(ids[0]);
        pool.enqueue(ids[1]);
        set.remove(ids[1]);

        let requester = ConnectionId::generate();
        assert_eq!(pool.take_next_eligible(requester, &set), Some(ids[0]));
        assert!(pool.contains(ids[1]));
    }

    #[test]
    fn test_remove() {
        let mut pool = WaitingPool::new();
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        pool.enqueue(a);
        pool.enqueue(b);

        assert!(pool.remove(a));
        assert!(!pool.remove(a));
        assert_eq!(pool.iter().collect::<Vec<_>>(), vec![b]);
    }
}
