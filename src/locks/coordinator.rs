//! Caller-facing lock coordinator: retrying acquisition, scoped locks and
//! lock-state queries.

use super::engine;
use super::guard::LockGuard;
use super::request::LockRequest;
use super::retry::{RetryPolicy, retry};
use super::table::LockTable;
use super::types::{LockInfo, LockMode};
use crate::config::Config;
use crate::error::{Result, TreelockError};
use crate::graph::{ObjectGraph, ObjectId};
use std::collections::BTreeSet;

/// Arbitrates read/write access to the objects of one graph.
///
/// One coordinator is shared (by reference or `Arc`) by every editing session
/// of a process. It owns the lock table; the graph is only read.
#[derive(Debug)]
pub struct LockCoordinator<G> {
    table: LockTable,
    graph: G,
    policy: RetryPolicy,
}

impl<G: ObjectGraph> LockCoordinator<G> {
    /// Create a coordinator with the default retry policy.
    pub fn new(graph: G) -> Self {
        Self::with_policy(graph, RetryPolicy::default())
    }

    pub fn with_policy(graph: G, policy: RetryPolicy) -> Self {
        Self {
            table: LockTable::new(),
            graph,
            policy,
        }
    }

    /// Create a coordinator using the retry settings from `config`.
    pub fn from_config(graph: G, config: &Config) -> Self {
        Self::with_policy(graph, config.retry_policy())
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn table(&self) -> &LockTable {
        &self.table
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Make a single attempt, without retrying.
    ///
    /// The lock, if taken, stays held until [`release`](Self::release).
    pub fn try_acquire(&self, mode: LockMode, request: &LockRequest) -> Result<bool> {
        engine::acquire(
            &self.table,
            &self.graph,
            &request.target,
            &request.owner,
            mode,
        )
    }

    /// Acquire `mode` for `request`, retrying per the policy.
    ///
    /// # Returns
    ///
    /// * `Ok(LockGuard)` - Lock held; released when the guard is dropped
    /// * `Err(TreelockError::LockingFailed)` - Still contended after the last attempt
    /// * `Err(TreelockError::NotFound)` / `Err(TreelockError::EmptyRequest)` - Bad request, not retried
    pub fn acquire(&self, mode: LockMode, request: &LockRequest) -> Result<LockGuard<'_>> {
        let what = format!("cannot {} lock {}", mode, request.describe());

        let attempts = retry(&self.policy, &what, |_| self.try_acquire(mode, request))
            .inspect_err(|e| {
                if e.is_contention() {
                    tracing::warn!(owner = %request.owner, %mode, ids = ?request.target.ids, "{}", e);
                }
            })?;

        tracing::debug!(
            owner = %request.owner,
            %mode,
            ids = ?request.target.ids,
            tree = request.target.tree,
            attempts,
            "lock acquired"
        );

        Ok(LockGuard::new(
            &self.table,
            request.target.clone(),
            request.owner.clone(),
            mode,
        ))
    }

    /// Release a lock previously kept past its guard. Releasing something not
    /// held is a no-op.
    pub fn release(&self, mode: LockMode, request: &LockRequest) {
        let revoked = engine::release(&self.table, &request.target, &request.owner, mode);
        tracing::debug!(owner = %request.owner, %mode, ids = ?request.target.ids, revoked, "lock released");
    }

    /// Acquire `mode`, run `f`, and release according to the request policy.
    ///
    /// The result of `f` is returned unchanged. If `f` panics the lock is
    /// released while unwinding.
    pub fn with_lock<T, E, F>(
        &self,
        mode: LockMode,
        request: &LockRequest,
        f: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<TreelockError>,
    {
        let guard = self.acquire(mode, request)?;
        let result = f();

        if request.releases_after(result.is_ok()) {
            guard.release();
        } else {
            guard.keep();
        }

        result
    }

    /// [`with_lock`](Self::with_lock) in write mode.
    pub fn with_write_lock<T, E, F>(&self, request: &LockRequest, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<TreelockError>,
    {
        self.with_lock(LockMode::Write, request, f)
    }

    /// [`with_lock`](Self::with_lock) in read mode.
    pub fn with_read_lock<T, E, F>(&self, request: &LockRequest, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<TreelockError>,
    {
        self.with_lock(LockMode::Read, request, f)
    }

    pub fn is_write_locked(&self, id: &str, owner: &str, tree: bool) -> bool {
        self.table.is_locked(id, owner, LockMode::Write, tree)
    }

    pub fn is_read_locked(&self, id: &str, owner: &str, tree: bool) -> bool {
        self.table.is_locked(id, owner, LockMode::Read, tree)
    }

    /// Fail unless `owner` write-locks `id` (with `tree`, a covering tree lock counts).
    pub fn assert_write_locked(&self, id: &str, owner: &str, tree: bool) -> Result<()> {
        if !self.is_write_locked(id, owner, tree) {
            return Err(TreelockError::NotLocked(format!(
                "Object is not write locked: '{}' (owner '{}').",
                id, owner
            )));
        }
        Ok(())
    }

    /// Fail unless `owner` read-locks `id` (with `tree`, a covering tree lock counts).
    pub fn assert_read_locked(&self, id: &str, owner: &str, tree: bool) -> Result<()> {
        if !self.is_read_locked(id, owner, tree) {
            return Err(TreelockError::NotLocked(format!(
                "Object is not read locked: '{}' (owner '{}').",
                id, owner
            )));
        }
        Ok(())
    }

    /// The ids among `ids` that no other owner has write-locked.
    pub fn ids_not_write_locked<'a, I>(&self, ids: I, owner: &str) -> BTreeSet<ObjectId>
    where
        I: IntoIterator<Item = &'a ObjectId>,
    {
        self.table.unlocked_subset(ids, owner)
    }

    /// All active locks, sorted by object id.
    pub fn locks(&self) -> Vec<LockInfo> {
        self.table.snapshot()
    }

    /// Active locks older than `stale_minutes`.
    pub fn stale_locks(&self, stale_minutes: u32) -> Vec<LockInfo> {
        self.table.stale(stale_minutes)
    }

    /// Drop every lock `owner` holds, e.g. after its session disconnected.
    pub fn release_owner(&self, owner: &str) -> usize {
        let evicted = self.table.release_owner(owner);
        if evicted > 0 {
            tracing::info!(owner, evicted, "released all locks of owner");
        }
        evicted
    }
}
