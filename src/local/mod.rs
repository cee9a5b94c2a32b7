//! Local Tier Module
//!
//! Wraps a bounded key→bytes store and layers an optional absolute-TTL
//! stamp onto stored payloads. Capacity eviction stays with the store; this
//! adapter only adds and validates the soft TTL layer.

mod lru;
mod store;

pub use store::{ByteStore, LruStore};

use chrono::Utc;
use tracing::debug;

// == Constants ==
/// Fixed epoch for the TTL stamp: 2020-01-01T00:00:00Z.
///
/// Shared by every process using the same store; part of the wire format.
pub const STAMP_EPOCH_SECS: i64 = 1_577_836_800;

/// Size of the appended TTL stamp in bytes
const STAMP_LEN: usize = 4;

// == Stamp Encoding ==
/// Encodes "now" as seconds since the fixed epoch, 4 bytes little-endian.
fn encode_stamp(unix_secs: i64) -> [u8; STAMP_LEN] {
    ((unix_secs - STAMP_EPOCH_SECS) as i32).to_le_bytes()
}

/// Decodes a stamp back into seconds since the Unix epoch.
fn decode_stamp(bytes: &[u8]) -> i64 {
    let mut stamp = [0u8; STAMP_LEN];
    stamp.copy_from_slice(bytes);
    i64::from(i32::from_le_bytes(stamp)) + STAMP_EPOCH_SECS
}

// == Local Tier ==
/// The local cache tier: a bounded store plus an optional write-time TTL
/// stamp appended to every payload.
pub struct LocalTier {
    store: Box<dyn ByteStore>,
    ttl_secs: i64,
}

impl LocalTier {
    /// Creates a local tier over a bounded store.
    ///
    /// A TTL of zero disables stamping entirely; payloads then pass through
    /// unchanged in both directions.
    pub fn new(store: Box<dyn ByteStore>, ttl_secs: i64) -> Self {
        Self {
            store,
            ttl_secs: ttl_secs.max(0),
        }
    }

    /// Stores a payload, appending the TTL stamp when stamping is enabled.
    pub fn set(&self, key: &str, mut bytes: Vec<u8>) {
        if self.ttl_secs > 0 {
            bytes.extend_from_slice(&encode_stamp(Utc::now().timestamp()));
        }
        self.store.set(key, bytes);
    }

    /// Retrieves a payload, evicting it first when its stamp has expired.
    ///
    /// Panics if a non-empty entry is shorter than the stamp while stamping
    /// is enabled; such an entry cannot have been written by this adapter.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let bytes = self.store.get(key)?;
        if self.ttl_secs == 0 || bytes.is_empty() {
            return Some(bytes);
        }
        assert!(
            bytes.len() >= STAMP_LEN,
            "local cache entry shorter than its ttl stamp"
        );

        let split = bytes.len() - STAMP_LEN;
        let written_at = decode_stamp(&bytes[split..]);
        let age = Utc::now().timestamp() - written_at;
        if age > self.ttl_secs {
            debug!(key, age, "local cache entry expired");
            self.store.delete(key);
            return None;
        }
        Some(bytes[..split].to_vec())
    }

    /// Removes the entry for a key.
    pub fn delete(&self, key: &str) {
        self.store.delete(key);
    }
}
