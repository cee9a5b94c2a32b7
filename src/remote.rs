//! Remote Tier Module
//!
//! The port a concrete network client (Redis, memcached, anything) must
//! implement for the shared remote tier. The core calls this interface but
//! owns none of its behavior: every method defaults to a distinguishable
//! "not implemented" error so a partially wired collaborator surfaces as a
//! configuration problem rather than a transport failure.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

// == Unimplemented Sentinel ==
/// Marker error returned by the default method bodies.
///
/// The orchestrator downcasts for this type and propagates it unwrapped as
/// [`crate::CacheError::Unimplemented`]; any other collaborator error is
/// wrapped into [`crate::CacheError::Remote`].
#[derive(Debug, Error)]
#[error("remote tier does not implement '{0}'")]
pub struct Unimplemented(pub &'static str);

// == Remote Tier Trait ==
/// Abstract capability of the shared remote store.
///
/// Implementations receive already-encoded payloads; the TTL is the item's
/// normalized expiration and is always positive.
pub trait RemoteTier: Send + Sync {
    /// Unconditionally stores a payload under a key.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()> {
        let _ = (key, value, ttl);
        Err(Unimplemented("set").into())
    }

    /// Stores a payload only if the key already exists.
    fn setxx(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()> {
        let _ = (key, value, ttl);
        Err(Unimplemented("setxx").into())
    }

    /// Stores a payload only if the key does not exist yet.
    fn setnx(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()> {
        let _ = (key, value, ttl);
        Err(Unimplemented("setnx").into())
    }

    /// Retrieves the payload stored under a key, absent on a miss.
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let _ = key;
        Err(Unimplemented("get").into())
    }

    /// Removes the given keys, returning how many were actually removed.
    fn delete(&self, keys: &[&str]) -> anyhow::Result<u64> {
        let _ = keys;
        Err(Unimplemented("delete").into())
    }
}

impl<R: RemoteTier + ?Sized> RemoteTier for Arc<R> {
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()> {
        (**self).set(key, value, ttl)
    }

    fn setxx(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()> {
        (**self).setxx(key, value, ttl)
    }

    fn setnx(&self, key: &str, value: &[u8], ttl: Duration) -> anyhow::Result<()> {
        (**self).setnx(key, value, ttl)
    }

    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn delete(&self, keys: &[&str]) -> anyhow::Result<u64> {
        (**self).delete(keys)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl RemoteTier for Bare {}

    #[test]
    fn test_defaults_signal_unimplemented() {
        let remote = Bare;
        let err = remote.get("k").unwrap_err();
        let unimplemented = err.downcast_ref::<Unimplemented>().unwrap();
        assert_eq!(unimplemented.0, "get");

        let err = remote.set("k", b"v", Duration::from_secs(1)).unwrap_err();
        assert!(err.downcast_ref::<Unimplemented>().is_some());
    }

    #[test]
    fn test_shared_handle_delegates() {
        struct Echo;

        impl RemoteTier for Echo {
            fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
                Ok(Some(key.as_bytes().to_vec()))
            }
        }

        // An Arc-wrapped collaborator is itself a remote tier, so callers
        // can keep a handle for inspection while the cache owns a clone.
        let remote = Arc::new(Echo);
        assert_eq!(remote.get("k").unwrap(), Some(b"k".to_vec()));

        let err = remote.delete(&["k"]).unwrap_err();
        assert_eq!(err.downcast_ref::<Unimplemented>().unwrap().0, "delete");
    }
}
