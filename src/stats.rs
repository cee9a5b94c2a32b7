//! Cache Statistics Module
//!
//! Hit/miss counters for remote-tier pressure. Local-tier hits are not
//! counted; the numbers measure how often the remote tier was asked for a
//! key and whether it had one.

use std::cell::Cell;

use serde::Serialize;

// == Cache Stats ==
/// Read-only snapshot of the hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Remote reads that found a value
    pub hits: u64,
    /// Remote reads that found nothing or failed in transport
    pub misses: u64,
}

impl CacheStats {
    /// Hit rate over all counted remote reads, 0.0 when none occurred.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Mutable counters living behind the orchestrator's shared re-entrant
/// lock. `Cell` because the re-entrant lock only hands out shared access.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl Counters {
    pub fn record_hit(&self) {
        self.hits.set(self.hits.get() + 1);
    }

    pub fn record_miss(&self) {
        self.misses.set(self.misses.get() + 1);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
        }
    }
}
