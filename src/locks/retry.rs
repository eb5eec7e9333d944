//! Bounded retry for lock acquisition.

use crate::error::{Result, TreelockError};
use std::time::Duration;

/// How often and how patiently to retry a contended acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,

    /// Pause between two attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Default number of attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 13;

    /// Default pause between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(150);

    /// Create a policy. `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

/// Run `attempt` until it reports success or the policy is exhausted.
///
/// `attempt` receives the 1-based attempt number and returns `Ok(true)` on
/// success, `Ok(false)` on contention and `Err` for anything that retrying
/// cannot fix; errors are returned at once. The thread sleeps between
/// attempts but not after the last one.
///
/// # Returns
///
/// * `Ok(n)` - Succeeded on attempt `n`
/// * `Err(TreelockError::LockingFailed)` - Every attempt was contended
pub fn retry<F>(policy: &RetryPolicy, what: &str, mut attempt: F) -> Result<u32>
where
    F: FnMut(u32) -> Result<bool>,
{
    let max_attempts = policy.max_attempts.max(1);

    for n in 1..=max_attempts {
        if attempt(n)? {
            return Ok(n);
        }

        if n < max_attempts {
            tracing::trace!(attempt = n, what, "contended, retrying");
            if !policy.delay.is_zero() {
                std::thread::sleep(policy.delay);
            }
        }
    }

    Err(TreelockError::LockingFailed(format!(
        "{} (gave up after {} attempts)",
        what, max_attempts
    )))
}
