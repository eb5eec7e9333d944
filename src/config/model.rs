//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for a lock coordinator.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Attempts per lock acquisition, including the first (at least 1).
    #[serde(default = "default_lock_max_attempts")]
    pub lock_max_attempts: u32,

    /// Milliseconds to wait between two attempts.
    #[serde(default = "default_lock_retry_delay_ms")]
    pub lock_retry_delay_ms: u64,

    /// Minutes after which a held lock is reported as stale.
    #[serde(default = "default_lock_stale_minutes")]
    pub lock_stale_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_max_attempts: default_lock_max_attempts(),
            lock_retry_delay_ms: default_lock_retry_delay_ms(),
            lock_stale_minutes: default_lock_stale_minutes(),
        }
    }
}
