//! Bounded Store Module
//!
//! The local tier's storage collaborator: a bounded key→bytes store that
//! owns its own capacity-based eviction. [`LruStore`] is the default
//! implementation; anything else can be plugged in through [`ByteStore`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::local::lru::LruTracker;

// == Byte Store Trait ==
/// A bounded key→bytes store with interior mutability.
///
/// Capacity-based eviction is entirely the implementation's responsibility;
/// the local tier adapter only layers a soft TTL on top.
pub trait ByteStore: Send + Sync {
    /// Stores bytes under a key, overwriting any existing entry.
    fn set(&self, key: &str, bytes: Vec<u8>);

    /// Retrieves the bytes stored under a key.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Removes the entry for a key, if any.
    fn delete(&self, key: &str);
}

impl<S: ByteStore + ?Sized> ByteStore for Arc<S> {
    fn set(&self, key: &str, bytes: Vec<u8>) {
        (**self).set(key, bytes)
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) {
        (**self).delete(key)
    }
}

// == LRU Store ==
/// Default bounded store: a HashMap with least-recently-used eviction.
#[derive(Debug)]
pub struct LruStore {
    inner: Mutex<LruStoreInner>,
}

#[derive(Debug)]
struct LruStoreInner {
    entries: HashMap<String, Vec<u8>>,
    lru: LruTracker,
    capacity: usize,
}

impl LruStore {
    /// Creates a store holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "store capacity must be positive");
        Self {
            inner: Mutex::new(LruStoreInner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                capacity,
            }),
        }
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl ByteStore for LruStore {
    fn set(&self, key: &str, bytes: Vec<u8>) {
        let mut inner = self.inner.lock();

        // Evict the oldest entry when inserting a new key at capacity.
        if !inner.entries.contains_key(key) && inner.entries.len() >= inner.capacity {
            if let Some(evicted) = inner.lru.evict_oldest() {
                inner.entries.remove(&evicted);
                debug!(key = evicted.as_str(), "evicted least recently used entry");
            }
        }

        inner.entries.insert(key.to_string(), bytes);
        inner.lru.touch(key);
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock();
        let bytes = inner.entries.get(key).cloned()?;
        inner.lru.touch(key);
        Some(bytes)
    }

    fn delete(&self, key: &str) {
        let mut inner = self.inner.lock();
        inner.entries.remove(key);
        inner.lru.remove(key);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = LruStore::new(4);
        store.set("k", vec![1, 2, 3]);
        assert_eq!(store.get("k"), Some(vec![1, 2, 3]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = LruStore::new(4);
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_overwrite_keeps_one_entry() {
        let store = LruStore::new(4);
        store.set("k", vec![1]);
        store.set("k", vec![2]);
        assert_eq!(store.get("k"), Some(vec![2]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let store = LruStore::new(4);
        store.set("k", vec![1]);
        store.delete("k");
        assert!(store.is_empty());
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_capacity_eviction() {
        let store = LruStore::new(3);
        store.set("a", vec![1]);
        store.set("b", vec![2]);
        store.set("c", vec![3]);
        store.set("d", vec![4]);

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("a"), None);
        assert!(store.get("b").is_some());
        assert!(store.get("c").is_some());
        assert!(store.get("d").is_some());
    }

    #[test]
    fn test_get_refreshes_recency() {
        let store = LruStore::new(3);
        store.set("a", vec![1]);
        store.set("b", vec![2]);
        store.set("c", vec![3]);

        // Touch "a" so "b" becomes the eviction candidate.
        store.get("a");
        store.set("d", vec![4]);

        assert!(store.get("a").is_some());
        assert_eq!(store.get("b"), None);
    }

    #[test]
    #[should_panic(expected = "capacity must be positive")]
    fn test_zero_capacity_panics() {
        LruStore::new(0);
    }
}
