//! Expiry Index Module
//!
//! Tracks per-entry expiration deadlines so "which keys are expired" and
//! "when is the next expiry" never require a full cache scan.

use std::collections::{BTreeSet, HashMap};

// == Expiry Index ==
/// Ordered index of expiration deadlines.
///
/// Internally a `BTreeSet<(deadline, key)>` ordered by deadline plus a
/// reverse map from key to its current deadline. The two structures are
/// always updated together; the index as a whole lives inside the cache
/// store behind its lock.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    /// (deadline_ms, key), ordered by deadline
    by_deadline: BTreeSet<(u64, String)>,
    /// key -> deadline_ms currently registered
    deadlines: HashMap<String, u64>,
}

impl ExpiryIndex {
    /// Creates a new empty expiry index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Track ==
    /// Registers or updates a key's deadline; O(log n).
    pub fn track(&mut self, key: &str, expires_at_ms: u64) {
        if let Some(old) = self.deadlines.insert(key.to_string(), expires_at_ms) {
            self.by_deadline.remove(&(old, key.to_string()));
        }
        self.by_deadline.insert((expires_at_ms, key.to_string()));
    }

    // == Untrack ==
    /// Removes a key from the index.
    pub fn untrack(&mut self, key: &str) {
        if let Some(deadline) = self.deadlines.remove(key) {
            self.by_deadline.remove(&(deadline, key.to_string()));
        }
    }

    // == Sweep ==
    /// Removes and returns all keys whose deadline is <= `now_ms`.
    pub fn sweep(&mut self, now_ms: u64) -> Vec<String> {
        let mut expired = Vec::new();
        while let Some((deadline, key)) = self.by_deadline.first().cloned() {
            if deadline > now_ms {
                break;
            }
            self.by_deadline.remove(&(deadline, key.clone()));
            self.deadlines.remove(&key);
            expired.push(key);
        }
        expired
    }

    // == Peek Next ==
    /// Returns the earliest pending deadline without removing it.
    pub fn peek_next(&self) -> Option<u64> {
        self.by_deadline.first().map(|(deadline, _)| *deadline)
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Returns true if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_new() {
        let index = ExpiryIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.peek_next(), None);
    }

    #[test]
    fn test_track_and_peek() {
        let mut index = ExpiryIndex::new();

        index.track("b", 200);
        index.track("a", 100);
        index.track("c", 300);

        assert_eq!(index.len(), 3);
        assert_eq!(index.peek_next(), Some(100));
    }

    #[test]
    fn test_track_updates_deadline() {
        let mut index = ExpiryIndex::new();

        index.track("a", 100);
        index.track("a", 500);

        assert_eq!(index.len(), 1);
        assert_eq!(index.peek_next(), Some(500));

        // The stale (100, "a") pair must be gone
        assert!(index.sweep(200).is_empty());
    }

    #[test]
    fn test_sweep_removes_expired_only() {
        let mut index = ExpiryIndex::new();

        index.track("a", 100);
        index.track("b", 200);
        index.track("c", 300);

        let expired = index.sweep(200);
        assert_eq!(expired, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.peek_next(), Some(300));
    }

    #[test]
    fn test_sweep_boundary_inclusive() {
        let mut index = ExpiryIndex::new();

        index.track("a", 100);

        // deadline == now counts as expired
        assert_eq!(index.sweep(100), vec!["a".to_string()]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_untrack() {
        let mut index = ExpiryIndex::new();

        index.track("a", 100);
        index.track("b", 200);
        index.untrack("a");

        assert_eq!(index.len(), 1);
        assert_eq!(index.peek_next(), Some(200));
        assert!(index.sweep(150).is_empty());
    }

    #[test]
    fn test_untrack_nonexistent() {
        let mut index = ExpiryIndex::new();
        index.untrack("missing");
        assert!(index.is_empty());
    }

    #[test]
    fn test_same_deadline_distinct_keys() {
        let mut index = ExpiryIndex::new();

        index.track("a", 100);
        index.track("b", 100);

        let mut expired = index.sweep(100);
        expired.sort();
        assert_eq!(expired, vec!["a".to_string(), "b".to_string()]);
    }
}
