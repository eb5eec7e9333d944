//! RAII lock guard implementation.

use super::engine::{self, LockTarget};
use super::table::LockTable;
use super::types::{LockMode, OwnerId};

/// RAII guard for an acquired lock.
///
/// When dropped, including during unwinding, the lock is released. Call
/// [`keep`](Self::keep) to leave it held for a later explicit release.
#[derive(Debug)]
#[must_use = "dropping the guard releases the lock immediately"]
pub struct LockGuard<'a> {
    table: &'a LockTable,
    target: LockTarget,
    owner: OwnerId,
    mode: LockMode,

    /// Whether the lock has been released or handed off.
    released: bool,
}

impl<'a> LockGuard<'a> {
    pub(super) fn new(table: &'a LockTable, target: LockTarget, owner: OwnerId, mode: LockMode) -> Self {
        Self {
            table,
            target,
            owner,
            mode,
            released: false,
        }
    }

    pub fn target(&self) -> &LockTarget {
        &self.target
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Release the lock now instead of at the end of the scope.
    pub fn release(mut self) {
        self.unlock();
    }

    /// Leave the lock held after the guard is gone. Returns the target so the
    /// caller can release it later.
    pub fn keep(mut self) -> LockTarget {
        self.released = true;
        tracing::debug!(owner = %self.owner, mode = %self.mode, ids = ?self.target.ids, "lock kept");
        std::mem::replace(&mut self.target, LockTarget::new(Vec::<String>::new()))
    }

    fn unlock(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let revoked = engine::release(self.table, &self.target, &self.owner, self.mode);
        if revoked == 0 {
            tracing::warn!(
                owner = %self.owner,
                mode = %self.mode,
                ids = ?self.target.ids,
                "lock was already released"
            );
        } else {
            tracing::debug!(owner = %self.owner, mode = %self.mode, ids = ?self.target.ids, "lock released");
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.unlock();
    }
}
