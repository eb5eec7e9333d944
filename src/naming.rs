//! Name helpers for objects created by editing commands.
//!
//! Command handlers use these before adding an object to the graph: either
//! reject a clashing name outright or derive a free one (`box`, `box_1`, ...).

use crate::error::{Result, TreelockError};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::hash::Hash;

/// Anything that can answer "is this name taken".
pub trait NameSet {
    fn contains_name(&self, name: &str) -> bool;
}

impl<S: Borrow<str> + Ord> NameSet for BTreeSet<S> {
    fn contains_name(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<S: Borrow<str> + Hash + Eq> NameSet for HashSet<S> {
    fn contains_name(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<V> NameSet for BTreeMap<String, V> {
    fn contains_name(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

/// Fail unless `name` is non-empty and not already in `existing`.
pub fn ensure_unique_name<N: NameSet + ?Sized>(name: &str, existing: &N) -> Result<()> {
    if name.is_empty() {
        return Err(TreelockError::UserError("Name has to be set.".to_string()));
    }

    if existing.contains_name(name) {
        return Err(TreelockError::UserError(format!(
            "Name already exists: '{}'.",
            name
        )));
    }

    Ok(())
}

/// Return `orig_name` if free, otherwise the first free `orig_name_N` (N from 1).
pub fn make_name_unique<N: NameSet + ?Sized>(orig_name: &str, names: &N) -> String {
    let mut name = orig_name.to_string();
    let mut cnt = 1;

    while names.contains_name(&name) {
        name = format!("{}_{}", orig_name, cnt);
        cnt += 1;
    }

    name
}
