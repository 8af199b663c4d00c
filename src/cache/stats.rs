//! Map Statistics Module
//!
//! Counts reads, writes and removals, split by explicit delete and expiry.

use serde::Serialize;

// == Map Stats ==
/// Snapshot of map activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapStats {
    /// Number of `get` calls that found a value
    pub hits: u64,
    /// Number of `get` calls that found nothing
    pub misses: u64,
    /// Number of `set` calls
    pub sets: u64,
    /// Entries removed by `delete` or `clear`
    pub deletions: u64,
    /// Entries removed by their eviction timer firing
    pub expirations: u64,
    /// Current number of entries
    pub total_entries: usize,
    /// Current number of entries with a pending eviction
    pub pending_timers: usize,
}

impl MapStats {
    /// Creates a new MapStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Set ==
    /// Increments the set counter.
    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    // == Record Deletion ==
    /// Increments the explicit deletion counter.
    pub fn record_deletion(&mut self) {
        self.deletions += 1;
    }

    // == Record Expiration ==
    /// Increments the timer-driven expiration counter.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }
}
