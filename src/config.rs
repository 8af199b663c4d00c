//! Configuration Module
//!
//! Loads map defaults and demo settings from environment variables.

use std::env;

use crate::error::{MapError, Result};

/// Map configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in milliseconds used by `set_default`; negative means never expire
    pub default_ttl_ms: i64,
    /// TTL in milliseconds the demo binary memoizes its values for
    pub demo_ttl_ms: i64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `EXPIRING_MAP_DEFAULT_TTL_MS` - Default TTL in ms (default: -1, never expire)
    /// - `EXPIRING_MAP_DEMO_TTL_MS` - Demo memoization TTL in ms (default: 250)
    pub fn from_env() -> Self {
        Self {
            default_ttl_ms: env::var("EXPIRING_MAP_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(-1),
            demo_ttl_ms: env::var("EXPIRING_MAP_DEMO_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(250),
        }
    }

    /// Checks that the demo settings can actually demonstrate expiry.
    pub fn validate(&self) -> Result<()> {
        if self.demo_ttl_ms < 0 {
            return Err(MapError::InvalidConfig(format!(
                "EXPIRING_MAP_DEMO_TTL_MS must be >= 0, got {}",
                self.demo_ttl_ms
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: -1,
            demo_ttl_ms: 250,
        }
    }
}
