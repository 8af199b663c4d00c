//! Manual Scheduler
//!
//! Deterministic scheduler on a virtual clock. Time only moves when
//! `advance` is called, which makes expiry tests independent of wall-clock
//! delays.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::timer::{Action, Scheduler};

/// Handle to an action pending on a `ManualScheduler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ManualHandle {
    deadline: Instant,
    seq: u64,
}

struct ManualState {
    now: Instant,
    next_seq: u64,
    /// Ordered by deadline, then by scheduling order
    pending: BTreeMap<ManualHandle, Action>,
}

// == Manual Scheduler ==
/// Virtual-clock scheduler. Cloning shares the same clock and queue.
#[derive(Clone)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    /// Creates a scheduler whose clock starts at the current instant.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: Instant::now(),
                next_seq: 0,
                pending: BTreeMap::new(),
            })),
        }
    }

    /// Moves the clock forward by `by`, running every action that falls due.
    ///
    /// Actions run in deadline order with the clock set to their deadline.
    /// The internal lock is released while an action runs, so actions may
    /// schedule or cancel on this same scheduler.
    ///
    /// Returns the number of actions that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        let mut ran = 0;

        loop {
            let next = {
                let mut state = self.lock();
                match state.pending.first_key_value() {
                    Some((handle, _)) if handle.deadline <= target => {
                        let handle = *handle;
                        state.now = state.now.max(handle.deadline);
                        state.pending.remove(&handle)
                    }
                    _ => {
                        state.now = target;
                        None
                    }
                }
            };

            match next {
                Some(action) => {
                    action();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Number of actions still waiting to fire.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualHandle;

    fn now(&self) -> Instant {
        self.lock().now
    }

    fn schedule(&self, delay: Duration, action: Action) -> ManualHandle {
        let mut state = self.lock();
        let handle = ManualHandle {
            deadline: state.now + delay,
            seq: state.next_seq,
        };
        state.next_seq += 1;
        state.pending.insert(handle, action);
        handle
    }

    fn cancel(&self, handle: ManualHandle) {
        self.lock().pending.remove(&handle);
    }
}
