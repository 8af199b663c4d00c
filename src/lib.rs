//! Expiring Map - A self-cleaning in-memory key-value map
//!
//! Each entry may carry a TTL and is evicted by a scheduled timer once it
//! elapses, with no polling or read-time expiry checks.

pub mod cache;
pub mod config;
pub mod error;
pub mod timer;

pub use cache::{ExpiringMap, MapStats, Ttl};
pub use config::Config;
pub use timer::{ManualScheduler, Scheduler, TokioScheduler};
