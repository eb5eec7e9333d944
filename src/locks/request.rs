//! Lock requests and their release policy.

use super::engine::LockTarget;
use super::types::OwnerId;
use crate::graph::ObjectId;

/// What to lock, for whom, and when to let go.
///
/// ```
/// use treelock::locks::LockRequest;
///
/// let request = LockRequest::new("alice", ["scene1"])
///     .with_tree(true)
///     .with_auto_unlock(false);
/// assert!(request.target.tree);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRequest {
    /// The requesting client or session.
    pub owner: OwnerId,

    /// The objects to lock.
    pub target: LockTarget,

    /// Release when the protected block succeeds (default: true).
    pub auto_unlock: bool,

    /// Only check that locking is possible; always release (default: false).
    pub dry_run: bool,

    /// Keep holding the lock when the protected block fails (default: false).
    pub keep_on_error: bool,
}

impl LockRequest {
    pub fn new<I, S>(owner: impl Into<OwnerId>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ObjectId>,
    {
        Self {
            owner: owner.into(),
            target: LockTarget::new(ids),
            auto_unlock: true,
            dry_run: false,
            keep_on_error: false,
        }
    }

    /// Lock each id together with its whole subtree.
    pub fn with_tree(mut self, tree: bool) -> Self {
        self.target.tree = tree;
        self
    }

    pub fn with_auto_unlock(mut self, auto_unlock: bool) -> Self {
        self.auto_unlock = auto_unlock;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_keep_on_error(mut self, keep_on_error: bool) -> Self {
        self.keep_on_error = keep_on_error;
        self
    }

    /// Whether the lock must be released once the protected block has
    /// finished with the given outcome.
    pub fn releases_after(&self, succeeded: bool) -> bool {
        if self.dry_run {
            return true;
        }
        if succeeded {
            self.auto_unlock
        } else {
            !self.keep_on_error
        }
    }

    /// Short human-readable form used in errors and logs.
    pub fn describe(&self) -> String {
        format!(
            "{} [{}] for '{}'",
            if self.target.tree { "tree" } else { "objects" },
            self.target.ids.join(", "),
            self.owner
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let request = LockRequest::new("alice", ["a", "b"]);

        assert_eq!(request.owner, "alice");
        assert_eq!(request.target.ids, vec!["a", "b"]);
        assert!(!request.target.tree);
        assert!(request.auto_unlock);
        assert!(!request.dry_run);
        assert!(!request.keep_on_error);
    }

    #[test]
    fn release_policy() {
        let auto = LockRequest::new("o", ["a"]);
        assert!(auto.releases_after(true));
        assert!(auto.releases_after(false));

        let held = auto.clone().with_auto_unlock(false);
        assert!(!held.releases_after(true));
        assert!(held.releases_after(false));

        let sticky = held.clone().with_keep_on_error(true);
        assert!(!sticky.releases_after(true));
        assert!(!sticky.releases_after(false));

        let dry = sticky.with_dry_run(true);
        assert!(dry.releases_after(true));
        assert!(dry.releases_after(false));
    }

    #[test]
    fn describe_names_ids_and_owner() {
        let request = LockRequest::new("bob", ["obj1", "obj2"]).with_tree(true);
        assert_eq!(request.describe(), "tree [obj1, obj2] for 'bob'");
    }
}
