//! Cache Module
//!
//! Provides the expiring map together with its entry and statistics types.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{Ttl, TTL_MISSING, TTL_PERSISTENT};
pub use stats::MapStats;
pub use store::ExpiringMap;
