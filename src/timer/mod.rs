//! Timer Module
//!
//! The one-shot, cancellable timer facility the map schedules evictions on.
//!
//! # Schedulers
//! - `TokioScheduler`: detached tokio tasks, used in production
//! - `ManualScheduler`: virtual clock driven by `advance`, used in tests

mod manual;
mod runtime;

use std::time::{Duration, Instant};

pub use manual::{ManualHandle, ManualScheduler};
pub use runtime::TokioScheduler;

/// A callback run once when its timer fires.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

// == Scheduler Trait ==
/// Runs an action once after a delay, with the option to cancel it first.
///
/// Implementations must guarantee that an action whose handle was cancelled
/// before it started never runs, and that cancelling a handle whose action
/// already ran is a no-op. `schedule` must never run the action before
/// returning, even for a zero delay: the map calls it while holding the lock
/// the action needs.
pub trait Scheduler: Send + Sync + 'static {
    /// Opaque reference to a pending action.
    type Handle: Send + 'static;

    /// Current instant on this scheduler's clock.
    fn now(&self) -> Instant;

    /// Schedules `action` to run once after `delay`.
    fn schedule(&self, delay: Duration, action: Action) -> Self::Handle;

    /// Cancels a pending action.
    fn cancel(&self, handle: Self::Handle);
}
