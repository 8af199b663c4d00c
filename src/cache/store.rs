//! Expiring Map Module
//!
//! Key-value map whose entries remove themselves once their TTL elapses.
//! Every entry with a TTL owns exactly one scheduled eviction; replacing or
//! deleting the entry cancels it.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tracing::{debug, trace};

use crate::cache::entry::{expiry_delay, Entry, EntryId};
use crate::cache::{MapStats, Ttl};
use crate::config::Config;
use crate::error::Result;
use crate::timer::{Scheduler, TokioScheduler};

struct State<K, V, H> {
    entries: HashMap<K, Entry<V, H>>,
    next_id: EntryId,
    stats: MapStats,
}

impl<K, V, H> State<K, V, H> {
    /// Removes the entry under `key`, but only if it is the insertion `only`
    /// names when given. This is the single removal path of the map.
    fn take<Q>(&mut self, key: &Q, only: Option<EntryId>) -> Option<Entry<V, H>>
    where
        K: Borrow<Q> + Hash + Eq,
        Q: Hash + Eq + ?Sized,
    {
        match (self.entries.get(key), only) {
            (None, _) => None,
            (Some(entry), Some(id)) if entry.id != id => None,
            _ => self.entries.remove(key),
        }
    }
}

/// State reachable from scheduled evictions.
struct Shared<K, V, S: Scheduler> {
    scheduler: S,
    state: Mutex<State<K, V, S::Handle>>,
}

impl<K, V, S: Scheduler> Shared<K, V, S> {
    fn lock(&self) -> MutexGuard<'_, State<K, V, S::Handle>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs when the eviction of insertion `id` fires.
    fn evict(&self, key: &K, id: EntryId)
    where
        K: Hash + Eq,
    {
        let mut state = self.lock();
        match state.take(key, Some(id)) {
            Some(_fired) => {
                state.stats.record_expiration();
                debug!(entry_id = id, remaining = state.entries.len(), "Entry expired");
            }
            None => trace!(entry_id = id, "Stale eviction ignored"),
        }
    }

    /// Removes every entry, cancelling their evictions. Returns the count removed.
    fn drain(&self) -> usize {
        let removed: Vec<Entry<V, S::Handle>> = {
            let mut state = self.lock();
            state.entries.drain().map(|(_, entry)| entry).collect()
        };
        let count = removed.len();
        for entry in removed {
            if let Some(handle) = entry.eviction {
                self.scheduler.cancel(handle);
            }
        }
        count
    }
}

// == Expiring Map ==
/// In-memory map with per-entry TTL and timer-driven eviction.
///
/// Operations are synchronous and never block on timers. Expired entries
/// stay visible until their eviction runs; no read checks the clock.
///
/// # Single owner
/// The map is meant for a single owner. Evictions fire from the scheduler's
/// context, and the internal lock exists only so that they can reach the
/// entries soundly. It is not a concurrency contract: callers on several
/// threads get no atomicity across calls (e.g. a `has` followed by a `set`)
/// and must wrap the map in their own synchronization.
///
/// # Example
/// ```no_run
/// use expiring_map::ExpiringMap;
///
/// #[tokio::main]
/// async fn main() -> expiring_map::error::Result<()> {
///     let map: ExpiringMap<String, u32> = ExpiringMap::new()?;
///     map.set("answer".to_string(), 42, 1_000)
///         .set("forever".to_string(), 7, -1);
///     assert_eq!(map.get("answer"), Some(42));
///     assert_eq!(map.ttl("forever"), -1);
///     Ok(())
/// }
/// ```
pub struct ExpiringMap<K, V, S: Scheduler = TokioScheduler> {
    shared: Arc<Shared<K, V, S>>,
    /// TTL in milliseconds used by `set_default`
    default_ttl_ms: i64,
}

impl<K, V> ExpiringMap<K, V, TokioScheduler>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    // == Constructor ==
    /// Creates a map whose evictions run on the current tokio runtime.
    pub fn new() -> Result<Self> {
        Ok(Self::with_scheduler(TokioScheduler::current()?))
    }

    /// Creates a map on the current tokio runtime using `config` defaults.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new()?.with_default_ttl(config.default_ttl_ms))
    }
}

impl<K, V, S> ExpiringMap<K, V, S>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
    S: Scheduler,
{
    /// Creates a map whose evictions run on `scheduler`.
    pub fn with_scheduler(scheduler: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                scheduler,
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    next_id: 0,
                    stats: MapStats::new(),
                }),
            }),
            default_ttl_ms: -1,
        }
    }

    /// Sets the TTL used by `set_default`. Negative means never expire.
    pub fn with_default_ttl(mut self, ttl_ms: i64) -> Self {
        self.default_ttl_ms = ttl_ms;
        self
    }

    // == Has ==
    /// Returns true if an entry for `key` exists.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.lock().entries.contains_key(key)
    }

    // == Get ==
    /// Returns a copy of the value stored under `key`.
    ///
    /// A key that never existed and one that expired both yield `None`.
    /// Only the hit/miss counters reported by `stats` change; entries and
    /// their timers are left untouched.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let mut state = self.shared.lock();
        match state.entries.get(key).map(|entry| entry.value.clone()) {
            Some(value) => {
                state.stats.record_hit();
                Some(value)
            }
            None => {
                state.stats.record_miss();
                None
            }
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL of `key` in milliseconds.
    ///
    /// `-1` means the entry never expires and `-2` means there is no entry.
    /// An entry past its deadline whose eviction has not run yet reports `0`.
    pub fn ttl<Q>(&self, key: &Q) -> i64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ttl_state(key).as_millis()
    }

    /// Typed form of `ttl`.
    pub fn ttl_state<Q>(&self, key: &Q) -> Ttl
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.shared.scheduler.now();
        self.shared
            .lock()
            .entries
            .get(key)
            .map_or(Ttl::Missing, |entry| entry.ttl(now))
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// A previous entry's pending eviction is cancelled before the new entry
    /// goes in. With `ttl_ms >= 0` the entry is evicted once `ttl_ms`
    /// milliseconds have elapsed; a negative `ttl_ms` stores it forever.
    ///
    /// Returns the map so calls can be chained.
    pub fn set(&self, key: K, value: V, ttl_ms: i64) -> &Self {
        let shared = &self.shared;
        let mut state = shared.lock();

        if let Some(replaced) = state.take(&key, None) {
            if let Some(handle) = replaced.eviction {
                shared.scheduler.cancel(handle);
            }
            trace!(entry_id = replaced.id, "Replaced entry");
        }

        let id = state.next_id;
        state.next_id += 1;

        let now = shared.scheduler.now();
        let (expires_at, eviction) = match expiry_delay(ttl_ms) {
            Some(delay) => match now.checked_add(delay) {
                Some(deadline) => (
                    Some(deadline),
                    Some(self.schedule_eviction(key.clone(), id, delay)),
                ),
                None => {
                    debug!(entry_id = id, ttl_ms, "TTL beyond clock range, storing without expiry");
                    (None, None)
                }
            },
            None => (None, None),
        };

        state.entries.insert(
            key,
            Entry {
                value,
                id,
                expires_at,
                eviction,
            },
        );
        state.stats.record_set();
        debug!(entry_id = id, ttl_ms, "Entry stored");

        self
    }

    /// Stores `value` under `key` with the map's default TTL.
    pub fn set_default(&self, key: K, value: V) -> &Self {
        self.set(key, value, self.default_ttl_ms)
    }

    // == Delete ==
    /// Removes the entry under `key`, cancelling its pending eviction.
    ///
    /// Returns false, with no effect, if there is no entry.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.shared.lock();
        match state.take(key, None) {
            Some(removed) => {
                if let Some(handle) = removed.eviction {
                    self.shared.scheduler.cancel(handle);
                }
                state.stats.record_deletion();
                debug!(entry_id = removed.id, "Entry deleted");
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry and cancels every pending eviction.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let removed = self.shared.drain();
        self.shared.lock().stats.deletions += removed as u64;
        debug!(removed, "Map cleared");
        removed
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.shared.lock().entries.len()
    }

    // == Is Empty ==
    /// Returns true if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.shared.lock().entries.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the map's counters.
    pub fn stats(&self) -> MapStats {
        let state = self.shared.lock();
        let mut stats = state.stats.clone();
        stats.total_entries = state.entries.len();
        stats.pending_timers = state
            .entries
            .values()
            .filter(|entry| entry.eviction.is_some())
            .count();
        stats
    }

    /// Schedules the eviction of insertion `id` of `key`.
    ///
    /// The action only holds a weak reference, so pending timers never keep
    /// a dropped map alive.
    fn schedule_eviction(&self, key: K, id: EntryId, delay: Duration) -> S::Handle {
        let shared: Weak<Shared<K, V, S>> = Arc::downgrade(&self.shared);
        self.shared.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.evict(&key, id);
                }
            }),
        )
    }
}

impl<K, V, S: Scheduler> Drop for ExpiringMap<K, V, S> {
    fn drop(&mut self) {
        let cancelled = self.shared.drain();
        if cancelled > 0 {
            trace!(cancelled, "Dropped map with live entries");
        }
    }
}

impl<K, V, S: Scheduler> fmt::Debug for ExpiringMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringMap")
            .field("entries", &self.shared.lock().entries.len())
            .field("default_ttl_ms", &self.default_ttl_ms)
            .finish()
    }
}
