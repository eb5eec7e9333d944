//! Configuration defaults for treelock.

// Default value functions for serde
pub(crate) fn default_lock_max_attempts() -> u32 {
    13
}
pub(crate) fn default_lock_retry_delay_ms() -> u64 {
    150
}
pub(crate) fn default_lock_stale_minutes() -> u32 {
    120
}
