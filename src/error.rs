//! Error types for the expiring map
//!
//! Map operations are total and never fail. Errors only arise while wiring
//! the map up: finding a runtime for the timer facility or reading config.

use thiserror::Error;

// == Map Error Enum ==
/// Unified error type for the crate.
#[derive(Error, Debug)]
pub enum MapError {
    /// No tokio runtime was available to host eviction timers
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// A configuration value is outside its accepted range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, MapError>;
