//! Item Module
//!
//! Defines the unit of a cache write: a key, a value (concrete or produced
//! on demand), a TTL, and the write-mode flags.

use std::fmt;
use std::time::Duration;

use crate::codec::Value;
use crate::error::{CacheError, Result};

// == Constants ==
/// TTL applied when an item's TTL is zero or negative
pub const DEFAULT_ITEM_TTL_SECS: i64 = 60 * 60;

// == Write Mode ==
/// Selects which remote write primitive a set uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Unconditional write
    #[default]
    Set,
    /// Write only if the key already exists
    IfExists,
    /// Write only if the key does not exist yet
    IfNotExists,
}

// == Producer ==
/// Deferred value computation, invoked at most once when an item's value is
/// read and no concrete value was supplied.
pub type Producer = Box<dyn FnOnce() -> Value + Send>;

// == Item ==
/// A single cache write request.
///
/// Constructed per call, consumed by one `set` or `once` invocation.
pub struct Item {
    pub(crate) key: String,
    value: Option<Value>,
    ttl: i64,
    producer: Option<Producer>,
    pub(crate) write_mode: WriteMode,
    pub(crate) skip_local_cache: bool,
}

impl Item {
    // == Constructors ==
    /// Creates an item with a concrete value and the default 1-hour TTL.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            ttl: DEFAULT_ITEM_TTL_SECS,
            producer: None,
            write_mode: WriteMode::Set,
            skip_local_cache: false,
        }
    }

    /// Creates an item whose value is computed on first read.
    pub fn lazy(key: impl Into<String>, producer: impl FnOnce() -> Value + Send + 'static) -> Self {
        Self {
            key: key.into(),
            value: None,
            ttl: DEFAULT_ITEM_TTL_SECS,
            producer: Some(Box::new(producer)),
            write_mode: WriteMode::Set,
            skip_local_cache: false,
        }
    }

    // == Builder Setters ==
    /// Sets the TTL in seconds. Zero or negative means "use the default".
    pub fn ttl(mut self, secs: i64) -> Self {
        self.ttl = secs;
        self
    }

    /// Sets the remote write mode.
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Bypasses the local tier for this item, as if none were configured.
    pub fn skip_local_cache(mut self, skip: bool) -> Self {
        self.skip_local_cache = skip;
        self
    }

    /// Attaches a deferred value computation.
    pub fn producer(mut self, producer: impl FnOnce() -> Value + Send + 'static) -> Self {
        self.producer = Some(Box::new(producer));
        self
    }

    // == Accessors ==
    /// The item's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolves the item's value.
    ///
    /// A pending producer runs at most once and its result is memoized as
    /// the concrete value. Fails with [`CacheError::MissingValue`] when
    /// neither a concrete value nor a producer exists.
    pub fn value(&mut self) -> Result<&Value> {
        if let Some(producer) = self.producer.take() {
            self.value = Some(producer());
        }
        self.value.as_ref().ok_or(CacheError::MissingValue)
    }

    /// Replaces the concrete value, discarding any pending producer.
    pub fn set_value(&mut self, value: Value) {
        self.producer = None;
        self.value = Some(value);
    }

    /// Removes the concrete value; a later write fails with
    /// [`CacheError::MissingValue`] unless a producer is attached.
    pub fn clear_value(&mut self) {
        self.value = None;
    }

    /// Returns the concrete value, if one is present, without running a
    /// pending producer.
    pub fn peek_value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The TTL sent to the remote tier: zero and negative inputs normalize
    /// to the 1-hour default.
    pub fn normalized_ttl(&self) -> Duration {
        if self.ttl <= 0 {
            Duration::from_secs(DEFAULT_ITEM_TTL_SECS as u64)
        } else {
            Duration::from_secs(self.ttl as u64)
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("ttl", &self.ttl)
            .field("has_producer", &self.producer.is_some())
            .field("write_mode", &self.write_mode)
            .field("skip_local_cache", &self.skip_local_cache)
            .finish()
    }
}
