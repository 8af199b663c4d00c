//! Tokio Scheduler
//!
//! Backs each scheduled action with a detached tokio task.

use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

use crate::error::Result;
use crate::timer::{Action, Scheduler};

// == Tokio Scheduler ==
/// Scheduler that spawns one sleeping task per action on a tokio runtime.
///
/// The tasks are detached: dropping the runtime drops them unrun, so a
/// pending eviction never holds the process open.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler on the runtime the caller is currently running in.
    ///
    /// Fails with `MapError::NoRuntime` outside of a tokio context.
    pub fn current() -> Result<Self> {
        Ok(Self::with_handle(Handle::try_current()?))
    }

    /// Creates a scheduler on an explicit runtime handle.
    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Scheduler for TokioScheduler {
    type Handle = AbortHandle;

    fn now(&self) -> Instant {
        // tokio's clock so that paused test time is respected
        tokio::time::Instant::now().into_std()
    }

    fn schedule(&self, delay: Duration, action: Action) -> AbortHandle {
        // Deadline is fixed now, not when the task is first polled
        let deadline = tokio::time::Instant::now().checked_add(delay);
        let task = self.runtime.spawn(async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => tokio::time::sleep(delay).await,
            }
            action();
        });
        task.abort_handle()
    }

    fn cancel(&self, handle: AbortHandle) {
        trace!("Aborting scheduled action");
        handle.abort();
    }
}
