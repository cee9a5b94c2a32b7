//! LRU Tracker Module
//!
//! Tracks access order for the default bounded store's eviction.

use std::collections::VecDeque;

// == LRU Tracker ==
/// Access-order tracker: front = most recently used, back = least.
#[derive(Debug, Default)]
pub(crate) struct LruTracker {
    order: VecDeque<String>,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.order.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_orders_by_recency() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");

        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_touch_same_key_keeps_one_entry() {
        let mut lru = LruTracker::new();
        lru.touch("k");
        lru.touch("k");
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");
        lru.remove("a");
        lru.remove("missing");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
    }
}
