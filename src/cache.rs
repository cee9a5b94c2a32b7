//! Cache Orchestrator Module
//!
//! Composes the codec, the local tier, and the remote tier port into one
//! get/set/delete/once/stats surface, owning the policy for which tier is
//! consulted, in what order, and how remote hits and misses are counted.

use parking_lot::ReentrantMutex;
use tracing::{debug, warn};

use crate::codec::{self, Value};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::item::{Item, WriteMode};
use crate::local::LocalTier;
use crate::remote::{RemoteTier, Unimplemented};
use crate::stats::{CacheStats, Counters};

// == Cache ==
/// The two-tier cache.
///
/// Reads go local-first, then remote with a local back-fill; writes go to
/// the local tier (caching side-effect) and then the remote tier (source of
/// truth). One process-wide re-entrant lock guards the stats counters and
/// the whole `once` critical section; plain get/set/delete only touch it
/// for counter updates.
pub struct Cache {
    remote: Option<Box<dyn RemoteTier>>,
    local: Option<LocalTier>,
    stats_enabled: bool,
    lock: ReentrantMutex<Counters>,
}

impl Cache {
    // == Constructor ==
    /// Builds a cache from its configuration.
    pub fn new(config: CacheConfig) -> Self {
        let local = config
            .local_store
            .map(|store| LocalTier::new(store, config.local_cache_ttl_secs));
        Self {
            remote: config.remote,
            local,
            stats_enabled: config.stats_enabled,
            lock: ReentrantMutex::new(Counters::default()),
        }
    }

    // == Set ==
    /// Encodes the item's value once and writes it to every configured
    /// tier, dispatching the remote write per the item's write mode.
    ///
    /// Fails with [`CacheError::MissingValue`] when the item has no value,
    /// and with [`CacheError::NoTiers`] when neither tier is configured.
    /// A remote "not implemented" signal propagates unwrapped.
    pub fn set(&self, item: &mut Item) -> Result<()> {
        self.set_bytes(item)?;
        Ok(())
    }

    /// Like [`Cache::set`], but hands back the encoded payload for reuse.
    fn set_bytes(&self, item: &mut Item) -> Result<Vec<u8>> {
        let bytes = codec::encode(item.value()?)?;

        // Local write first: a caching side-effect, never the source of truth.
        if let Some(local) = &self.local {
            local.set(&item.key, bytes.clone());
        }

        let Some(remote) = &self.remote else {
            return if self.local.is_some() {
                Ok(bytes)
            } else {
                Err(CacheError::NoTiers)
            };
        };

        let ttl = item.normalized_ttl();
        let (op, result) = match item.write_mode {
            WriteMode::Set => ("set", remote.set(&item.key, &bytes, ttl)),
            WriteMode::IfExists => ("setxx", remote.setxx(&item.key, &bytes, ttl)),
            WriteMode::IfNotExists => ("setnx", remote.setnx(&item.key, &bytes, ttl)),
        };
        result.map_err(|e| remote_error(op, e))?;
        Ok(bytes)
    }

    // == Get ==
    /// Fetches and decodes the value stored under a key.
    ///
    /// Returns `Ok(None)` on a remote-tier miss; fails with
    /// [`CacheError::Miss`] when only a local tier is configured and it has
    /// no entry.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let bytes = self.get_bytes(key, false)?;
        codec::decode(bytes.as_deref())
    }

    /// Like [`Cache::get`], but bypasses the local tier entirely.
    pub fn get_skipping_local_cache(&self, key: &str) -> Result<Option<Value>> {
        let bytes = self.get_bytes(key, true)?;
        codec::decode(bytes.as_deref())
    }

    /// Byte-fetch policy shared by `get` and `once`.
    ///
    /// Local hits return immediately and are not counted; the counters
    /// measure remote-tier pressure only.
    fn get_bytes(&self, key: &str, skip_local_cache: bool) -> Result<Option<Vec<u8>>> {
        if !skip_local_cache {
            if let Some(local) = &self.local {
                if let Some(bytes) = local.get(key) {
                    return Ok(Some(bytes));
                }
            }
        }

        let Some(remote) = &self.remote else {
            return if self.local.is_none() {
                Err(CacheError::NoTiers)
            } else {
                Err(CacheError::Miss)
            };
        };

        let fetched = match remote.get(key) {
            Ok(fetched) => fetched,
            Err(e) => {
                self.record_miss();
                return Err(remote_error("get", e));
            }
        };
        let Some(bytes) = fetched else {
            self.record_miss();
            return Ok(None);
        };
        self.record_hit();

        if !skip_local_cache {
            if let Some(local) = &self.local {
                debug!(key, "back-filling local tier from remote hit");
                local.set(key, bytes.clone());
            }
        }
        Ok(Some(bytes))
    }

    // == Delete ==
    /// Removes a key from both tiers.
    ///
    /// The local delete is unconditional and best-effort. A remote delete
    /// that removed nothing fails with [`CacheError::Miss`].
    pub fn delete(&self, key: &str) -> Result<()> {
        if let Some(local) = &self.local {
            local.delete(key);
        }

        let Some(remote) = &self.remote else {
            return if self.local.is_some() {
                Ok(())
            } else {
                Err(CacheError::NoTiers)
            };
        };

        let removed = remote
            .delete(&[key])
            .map_err(|e| remote_error("delete", e))?;
        if removed == 0 {
            return Err(CacheError::Miss);
        }
        Ok(())
    }

    // == Once ==
    /// Single-flight read-or-compute-and-cache.
    ///
    /// When the key is not cached, exactly one concurrent caller runs the
    /// item's producer and writes the result; every caller observes the
    /// same value through `item`. Failures inside the critical section are
    /// swallowed and leave the item's value untouched. A cached entry that
    /// fails to decode is evicted and the whole sequence retried once.
    pub fn once(&self, item: &mut Item) -> Result<()> {
        self.once_attempt(item, false)
    }

    fn once_attempt(&self, item: &mut Item, retried: bool) -> Result<()> {
        let (bytes, cached) = self.fetch_or_populate(item);
        let Some(bytes) = bytes else {
            return Ok(());
        };

        match codec::decode(Some(&bytes)) {
            Ok(Some(value)) => {
                item.set_value(value);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) if cached && !retried => {
                warn!(key = item.key.as_str(), error = %e, "evicting corrupt cached entry");
                self.delete(&item.key)?;
                self.once_attempt(item, true)
            }
            Err(e) => {
                debug!(key = item.key.as_str(), error = %e, "discarding undecodable payload");
                Ok(())
            }
        }
    }

    /// The locked fetch-or-populate section of `once`.
    ///
    /// Returns the raw bytes (absent on a miss or a swallowed failure) and
    /// whether they came from cache. With a local tier configured, having
    /// consulted it at all marks the result as cached, even when the read
    /// found nothing.
    fn fetch_or_populate(&self, item: &mut Item) -> (Option<Vec<u8>>, bool) {
        let _guard = self.lock.lock();

        if let Some(local) = &self.local {
            return (local.get(&item.key), true);
        }

        match self.get_bytes(&item.key, item.skip_local_cache) {
            Ok(Some(bytes)) => (Some(bytes), true),
            Ok(None) => match self.set_bytes(item) {
                Ok(bytes) => (Some(bytes), false),
                Err(e) => {
                    debug!(key = item.key.as_str(), error = %e, "single-flight populate failed");
                    (None, false)
                }
            },
            Err(e) => {
                debug!(key = item.key.as_str(), error = %e, "single-flight fetch failed");
                (None, false)
            }
        }
    }

    // == Stats ==
    /// Snapshot of the hit/miss counters, absent when stats are disabled.
    pub fn stats(&self) -> Option<CacheStats> {
        if !self.stats_enabled {
            return None;
        }
        Some(self.lock.lock().snapshot())
    }

    fn record_hit(&self) {
        if self.stats_enabled {
            self.lock.lock().record_hit();
        }
    }

    fn record_miss(&self) {
        if self.stats_enabled {
            self.lock.lock().record_miss();
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

// == Remote Error Mapping ==
/// Wraps a collaborator error, letting the "not implemented" sentinel
/// through unchanged.
fn remote_error(op: &'static str, err: anyhow::Error) -> CacheError {
    match err.downcast::<Unimplemented>() {
        Ok(unimplemented) => CacheError::Unimplemented(unimplemented.0),
        Err(other) => CacheError::Remote { op, source: other },
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::anyhow;
    use parking_lot::Mutex;

    /// HashMap-backed remote tier test double.
    #[derive(Default)]
    struct FakeRemote {
        entries: Mutex<HashMap<String, Vec<u8>>>,
        gets: AtomicUsize,
        last_op: Mutex<Option<&'static str>>,
    }

    impl RemoteTier for FakeRemote {
        fn set(&self, key: &str, value: &[u8], _ttl: Duration) -> anyhow::Result<()> {
            *self.last_op.lock() = Some("set");
            self.entries.lock().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        fn setxx(&self, key: &str, value: &[u8], _ttl: Duration) -> anyhow::Result<()> {
            *self.last_op.lock() = Some("setxx");
            let mut entries = self.entries.lock();
            if entries.contains_key(key) {
                entries.insert(key.to_string(), value.to_vec());
            }
            Ok(())
        }

        fn setnx(&self, key: &str, value: &[u8], _ttl: Duration) -> anyhow::Result<()> {
            *self.last_op.lock() = Some("setnx");
            self.entries
                .lock()
                .entry(key.to_string())
                .or_insert_with(|| value.to_vec());
            Ok(())
        }

        fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Ok(self.entries.lock().get(key).cloned())
        }

        fn delete(&self, keys: &[&str]) -> anyhow::Result<u64> {
            let mut entries = self.entries.lock();
            let mut removed = 0;
            for key in keys {
                if entries.remove(*key).is_some() {
                    removed += 1;
                }
            }
            Ok(removed)
        }
    }

    /// Remote tier double whose every method fails in transport.
    struct BrokenRemote;

    impl RemoteTier for BrokenRemote {
        fn set(&self, _: &str, _: &[u8], _: Duration) -> anyhow::Result<()> {
            Err(anyhow!("connection refused"))
        }

        fn get(&self, _: &str) -> anyhow::Result<Option<Vec<u8>>> {
            Err(anyhow!("connection refused"))
        }

        fn delete(&self, _: &[&str]) -> anyhow::Result<u64> {
            Err(anyhow!("connection refused"))
        }
    }

    fn remote_cache(stats: bool) -> (Cache, Arc<FakeRemote>) {
        let remote = Arc::new(FakeRemote::default());
        let cache = Cache::new(
            CacheConfig::new()
                .remote(remote.clone())
                .stats_enabled(stats),
        );
        (cache, remote)
    }

    #[test]
    fn test_stats_count_remote_pressure() {
        let (cache, _remote) = remote_cache(true);

        assert_eq!(cache.get_skipping_local_cache("k").unwrap(), None); // miss
        cache.set(&mut Item::new("k", "v")).unwrap();
        assert!(cache.get_skipping_local_cache("k").unwrap().is_some()); // hit

        let stats = cache.stats().unwrap();
        assert_eq!(stats, CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_local_hit_not_counted() {
        let (cache, _remote) = remote_cache(true);
        cache.set(&mut Item::new("k", "v")).unwrap();

        // Served by the local tier, counters untouched.
        assert!(cache.get("k").unwrap().is_some());
        assert_eq!(cache.stats().unwrap(), CacheStats::default());
    }

    #[test]
    fn test_stats_disabled() {
        let (cache, _remote) = remote_cache(false);
        assert!(cache.stats().is_none());
    }

    #[test]
    fn test_remote_hit_backfills_local() {
        let (cache, remote) = remote_cache(false);

        // Seed the remote tier directly; the local tier starts cold.
        remote
            .entries
            .lock()
            .insert("k".to_string(), codec::encode(&Value::from("v")).unwrap());

        assert!(cache.get("k").unwrap().is_some());
        assert_eq!(remote.gets.load(Ordering::SeqCst), 1);

        // Second read is served by the back-filled local tier.
        assert!(cache.get("k").unwrap().is_some());
        assert_eq!(remote.gets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_writes_local_tier_unconditionally() {
        let (cache, remote) = remote_cache(false);
        cache
            .set(&mut Item::new("k", "v").skip_local_cache(true))
            .unwrap();

        // The flag only affects reads; the local write always happens, so
        // this read never reaches the remote tier.
        assert!(cache.get("k").unwrap().is_some());
        assert_eq!(remote.gets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_write_mode_dispatch() {
        let (cache, remote) = remote_cache(false);

        cache.set(&mut Item::new("k", "v")).unwrap();
        assert_eq!(*remote.last_op.lock(), Some("set"));

        cache
            .set(&mut Item::new("k", "v").write_mode(WriteMode::IfExists))
            .unwrap();
        assert_eq!(*remote.last_op.lock(), Some("setxx"));

        cache
            .set(&mut Item::new("k", "v").write_mode(WriteMode::IfNotExists))
            .unwrap();
        assert_eq!(*remote.last_op.lock(), Some("setnx"));
    }

    #[test]
    fn test_transport_error_wrapped() {
        let cache = Cache::new(
            CacheConfig::new()
                .remote(BrokenRemote)
                .no_local_cache()
                .stats_enabled(true),
        );

        let err = cache.set(&mut Item::new("k", "v")).unwrap_err();
        assert!(matches!(err, CacheError::Remote { op: "set", .. }));

        let err = cache.get("k").unwrap_err();
        assert!(matches!(err, CacheError::Remote { op: "get", .. }));
        assert_eq!(cache.stats().unwrap().misses, 1);
    }

    #[test]
    fn test_delete_zero_removed_is_miss() {
        let (cache, _remote) = remote_cache(false);
        let err = cache.delete("absent").unwrap_err();
        assert!(matches!(err, CacheError::Miss));
    }

    #[test]
    fn test_delete_removes_from_both_tiers() {
        let (cache, remote) = remote_cache(false);
        cache.set(&mut Item::new("k", "v")).unwrap();
        cache.delete("k").unwrap();

        assert!(remote.entries.lock().is_empty());
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn test_once_populates_on_miss_without_local_tier() {
        let remote = Arc::new(FakeRemote::default());
        let cache = Cache::new(CacheConfig::new().remote(remote.clone()).no_local_cache());

        let produced = Arc::new(AtomicUsize::new(0));
        let counter = produced.clone();
        let mut item = Item::lazy("k", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::from("computed")
        });

        cache.once(&mut item).unwrap();
        assert_eq!(item.peek_value(), Some(&Value::from("computed")));
        assert_eq!(produced.load(Ordering::SeqCst), 1);

        // Second once for the same key reads the cached entry instead.
        let mut second = Item::lazy("k", || Value::from("recomputed"));
        cache.once(&mut second).unwrap();
        assert_eq!(second.peek_value(), Some(&Value::from("computed")));
    }

    #[test]
    fn test_once_reads_cached_value_with_local_tier() {
        let (cache, _remote) = remote_cache(false);
        cache.set(&mut Item::new("k", "v1")).unwrap();

        let mut item = Item::new("k", "v2");
        cache.once(&mut item).unwrap();
        assert_eq!(item.peek_value(), Some(&Value::from("v1")));
    }

    #[test]
    fn test_once_swallows_populate_failure() {
        let cache = Cache::new(CacheConfig::new().remote(BrokenRemote).no_local_cache());

        let mut item = Item::new("k", "v");
        cache.once(&mut item).unwrap();
        // Value left as constructed; the failure is not surfaced.
        assert_eq!(item.peek_value(), Some(&Value::from("v")));
    }

    #[test]
    fn test_both_tiers_absent() {
        let cache = Cache::new(CacheConfig::new().no_local_cache());

        assert!(matches!(
            cache.set(&mut Item::new("k", "v")),
            Err(CacheError::NoTiers)
        ));
        assert!(matches!(cache.get("k"), Err(CacheError::NoTiers)));
        assert!(matches!(cache.delete("k"), Err(CacheError::NoTiers)));
    }
}
