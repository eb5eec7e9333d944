//! Hierarchical read/write locking for a shared object graph.
//!
//! Editing sessions lock objects before touching them:
//! - Read locks are shared between owners
//! - Write locks are exclusive, but the sole holder may re-acquire or upgrade
//! - Tree locks cover an object and every descendant, all or nothing
//! - Holds are counted per owner and mode: every successful acquisition,
//!   nested ones included, is undone by exactly one release
//!
//! # Layers
//!
//! - [`LockTable`]: the lock state, one mutex for the whole table
//! - [`resolve_tree`]: subtree expansion from the graph shape
//! - [`engine`]: one atomic attempt over ids or subtrees
//! - [`retry`] and [`LockCoordinator`]: bounded retries, scoped locks, queries
//!
//! # RAII Guards
//!
//! [`LockCoordinator::acquire`] returns a [`LockGuard`] that releases the lock
//! when dropped, so early returns, `?` and panics never leave a lock behind.
//! The scoped helpers ([`LockCoordinator::with_write_lock`] and friends) build
//! on the guard and apply the request's `auto_unlock` / `dry_run` /
//! `keep_on_error` policy.
//!
//! There is no wait queue and no fairness: a contended attempt fails at once
//! and the caller retries after a pause.

mod coordinator;
pub mod engine;
mod guard;
mod record;
mod request;
pub mod retry;
mod table;
mod tree;
mod types;


// Re-export public API
pub use coordinator::LockCoordinator;
pub use engine::LockTarget;
pub use guard::LockGuard;
pub use request::LockRequest;
pub use retry::RetryPolicy;
pub use table::LockTable;
pub use tree::resolve_tree;
pub use types::{Claim, ClaimSet, HolderInfo, LockInfo, LockMode, OwnerId};
