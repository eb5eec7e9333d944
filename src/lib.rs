//! Treelock: hierarchical read/write locks for a shared object graph.
//!
//! Several clients edit one scene of parent/child objects at the same time.
//! [`locks::LockCoordinator`] arbitrates who may read or write which objects,
//! either one object at a time or a whole subtree at once, and retries briefly
//! when an object is busy.
//!
//! ```
//! use treelock::graph::SceneGraph;
//! use treelock::locks::{LockCoordinator, LockRequest};
//!
//! let mut scene = SceneGraph::new();
//! scene.add_object("scene1", None)?;
//! scene.add_object("obj1", Some("scene1"))?;
//!
//! let coordinator = LockCoordinator::new(scene);
//! let request = LockRequest::new("alice", ["scene1"]).with_tree(true);
//! coordinator.with_write_lock(&request, || {
//!     assert!(coordinator.is_write_locked("obj1", "alice", true));
//!     Ok::<_, treelock::error::TreelockError>(())
//! })?;
//! assert!(coordinator.locks().is_empty());
//! # Ok::<(), treelock::error::TreelockError>(())
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod graph;
pub mod locks;
pub mod naming;
