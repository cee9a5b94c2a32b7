//! tiercache - A two-tier read-through/write-through cache
//!
//! A fast bounded in-process tier backed by a slower shared remote tier,
//! unified behind one API that hides which tier served a request. Values
//! travel through a self-describing tagged binary encoding, and concurrent
//! cache-miss computations for the same key collapse into one execution.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod item;
pub mod local;
pub mod remote;
pub mod stats;


pub use cache::Cache;
pub use codec::Value;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use item::{Item, WriteMode};
pub use local::{ByteStore, LocalTier, LruStore};
pub use remote::{RemoteTier, Unimplemented};
pub use stats::CacheStats;
