//! Acquisition engine: one atomic attempt over ids or whole subtrees.

use super::table::LockTable;
use super::tree::resolve_tree;
use super::types::{Claim, ClaimSet, LockMode};
use crate::error::{Result, TreelockError};
use crate::graph::{ObjectGraph, ObjectId};

/// The objects a lock request names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTarget {
    /// Requested ids (tree roots when `tree` is set).
    pub ids: Vec<ObjectId>,

    /// Lock every requested id together with its whole subtree.
    pub tree: bool,
}

impl LockTarget {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ObjectId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            tree: false,
        }
    }

    /// Target the subtrees rooted at `roots`.
    pub fn tree<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ObjectId>,
    {
        Self {
            tree: true,
            ..Self::new(roots)
        }
    }
}

/// Expand `target` into per-id claims.
///
/// # Returns
///
/// * `Err(TreelockError::EmptyRequest)` - No ids were given
/// * `Err(TreelockError::NotFound)` - A requested id (or root) is not in the graph
pub fn resolve_claims<G: ObjectGraph + ?Sized>(graph: &G, target: &LockTarget) -> Result<ClaimSet> {
    if target.ids.is_empty() {
        return Err(TreelockError::EmptyRequest);
    }

    let mut claims = ClaimSet::new();
    for id in &target.ids {
        if target.tree {
            let covered = resolve_tree(graph, id);
            if covered.is_empty() {
                return Err(TreelockError::NotFound(id.clone()));
            }
            for covered_id in covered {
                claims
                    .entry(covered_id)
                    .or_default()
                    .insert(Claim::Tree(id.clone()));
            }
        } else {
            if !graph.exists(id) {
                return Err(TreelockError::NotFound(id.clone()));
            }
            claims.entry(id.clone()).or_default().insert(Claim::Direct);
        }
    }

    Ok(claims)
}

/// Make one all-or-nothing attempt to lock `target` for `owner`.
///
/// Contention is `Ok(false)`, never an error, and leaves the table as it was.
///
/// Subtrees are resolved before the table mutex is taken. With a graph that
/// is mutated concurrently (such as `RwLock<G>`), an object added under a
/// root between resolution and the table update is not covered by the tree
/// lock; callers that add objects under a locked subtree should hold the
/// tree lock first.
pub fn acquire<G: ObjectGraph + ?Sized>(
    table: &LockTable,
    graph: &G,
    target: &LockTarget,
    owner: &str,
    mode: LockMode,
) -> Result<bool> {
    let claims = resolve_claims(graph, target)?;
    table.try_acquire(&claims, owner, mode)
}

/// Undo a successful [`acquire`] of the same target.
///
/// Tree releases revoke claims by root, so they do not depend on the graph
/// still having the shape it had at acquisition time.
pub fn release(table: &LockTable, target: &LockTarget, owner: &str, mode: LockMode) -> usize {
    table.release(&target.ids, owner, mode, target.tree)
}
