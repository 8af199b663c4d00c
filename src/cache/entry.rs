//! Map Entry Module
//!
//! Defines a stored entry with its expiry metadata, and the `Ttl` reading
//! reported for a key.

use std::time::{Duration, Instant};

/// Reported by `ttl()` for an entry that never expires.
pub const TTL_PERSISTENT: i64 = -1;

/// Reported by `ttl()` for a key with no entry.
pub const TTL_MISSING: i64 = -2;

/// Sequence number given to each inserted entry.
pub(crate) type EntryId = u64;

// == Map Entry ==
/// A stored value together with its expiry instant and pending eviction.
#[derive(Debug)]
pub(crate) struct Entry<V, H> {
    /// The stored value
    pub value: V,
    /// Distinguishes this insertion from earlier ones under the same key
    pub id: EntryId,
    /// Expiration instant, None = never expires
    pub expires_at: Option<Instant>,
    /// Handle to the scheduled eviction; present iff `expires_at` is
    pub eviction: Option<H>,
}

impl<V, H> Entry<V, H> {
    /// Remaining lifetime as observed at `now`.
    ///
    /// An entry whose instant has passed but whose eviction has not run yet
    /// reports `Remaining(Duration::ZERO)`.
    pub fn ttl(&self, now: Instant) -> Ttl {
        match self.expires_at {
            Some(expires) => Ttl::Remaining(expires.saturating_duration_since(now)),
            None => Ttl::Persistent,
        }
    }
}

// == TTL Reading ==
/// Typed result of a TTL lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The entry expires after this much more time
    Remaining(Duration),
    /// The entry never expires
    Persistent,
    /// No entry exists for the key
    Missing,
}

impl Ttl {
    /// Integer encoding: remaining milliseconds, `TTL_PERSISTENT` or `TTL_MISSING`.
    pub fn as_millis(&self) -> i64 {
        match self {
            Ttl::Remaining(left) => i64::try_from(left.as_millis()).unwrap_or(i64::MAX),
            Ttl::Persistent => TTL_PERSISTENT,
            Ttl::Missing => TTL_MISSING,
        }
    }
}

/// Converts a signed millisecond TTL into an eviction delay.
///
/// Negative values mean the entry never expires.
pub(crate) fn expiry_delay(ttl_ms: i64) -> Option<Duration> {
    u64::try_from(ttl_ms).ok().map(Duration::from_millis)
}
