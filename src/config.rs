//! Configuration Module
//!
//! Binds the optional remote tier, the optional local tier, the local-cache
//! TTL, and the stats flag. Constructed once and consumed by
//! [`crate::Cache::new`].

use crate::local::{ByteStore, LruStore};
use crate::remote::RemoteTier;

// == Constants ==
/// Capacity of the default bounded local store
pub const LOCAL_CACHE_CAPACITY: usize = 256;

/// Local-cache TTL applied when the configured value is zero
pub const DEFAULT_LOCAL_CACHE_TTL_SECS: i64 = 60;

// == Cache Config ==
/// Cache construction parameters.
///
/// Defaults: no remote tier, a 256-entry LRU local store, a 1-minute local
/// TTL, stats disabled. A negative local TTL disables stamping entirely.
pub struct CacheConfig {
    pub(crate) remote: Option<Box<dyn RemoteTier>>,
    pub(crate) local_store: Option<Box<dyn ByteStore>>,
    pub(crate) local_cache_ttl_secs: i64,
    pub(crate) stats_enabled: bool,
}

impl CacheConfig {
    /// Creates a config with the defaults above.
    pub fn new() -> Self {
        Self {
            remote: None,
            local_store: Some(Box::new(LruStore::new(LOCAL_CACHE_CAPACITY))),
            local_cache_ttl_secs: DEFAULT_LOCAL_CACHE_TTL_SECS,
            stats_enabled: false,
        }
    }

    /// Attaches a remote tier collaborator.
    pub fn remote(mut self, remote: impl RemoteTier + 'static) -> Self {
        self.remote = Some(Box::new(remote));
        self
    }

    /// Replaces the default bounded local store.
    pub fn local_store(mut self, store: Box<dyn ByteStore>) -> Self {
        self.local_store = Some(store);
        self
    }

    /// Removes the local tier entirely; every read and write then goes to
    /// the remote tier alone.
    pub fn no_local_cache(mut self) -> Self {
        self.local_store = None;
        self
    }

    /// Sets the local-cache TTL in seconds.
    ///
    /// Zero means "use the 1-minute default"; a negative value clamps to
    /// zero, which disables the TTL stamp.
    pub fn local_cache_ttl(mut self, secs: i64) -> Self {
        self.local_cache_ttl_secs = if secs < 0 {
            0
        } else if secs == 0 {
            DEFAULT_LOCAL_CACHE_TTL_SECS
        } else {
            secs
        };
        self
    }

    /// Enables or disables hit/miss accounting.
    pub fn stats_enabled(mut self, enabled: bool) -> Self {
        self.stats_enabled = enabled;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}
