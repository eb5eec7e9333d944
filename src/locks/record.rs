//! Per-object lock record.

use super::types::{Claim, HolderInfo, LockInfo, LockMode, OwnerId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// One granted hold: the mode it was taken in and why the owner holds the id.
pub(super) type Hold = (LockMode, Claim);

/// Current lock state of one object id.
///
/// A record exists only while somebody holds the id. Each holder keeps a
/// count per hold, so a re-entrant acquisition needs a matching release
/// before the hold disappears. The holder leaves when its last hold does.
///
/// The record mode is derived: `Write` while any write hold remains, `Read`
/// otherwise.
#[derive(Debug, Clone)]
pub(super) struct LockRecord {
    pub(super) holders: BTreeMap<OwnerId, BTreeMap<Hold, u32>>,
    pub(super) acquired_at: DateTime<Utc>,
}

impl LockRecord {
    pub(super) fn new(acquired_at: DateTime<Utc>) -> Self {
        Self {
            holders: BTreeMap::new(),
            acquired_at,
        }
    }

    pub(super) fn mode(&self) -> LockMode {
        let has_write = self
            .holders
            .values()
            .flat_map(|holds| holds.keys())
            .any(|(mode, _)| *mode == LockMode::Write);
        if has_write {
            LockMode::Write
        } else {
            LockMode::Read
        }
    }

    /// The only holder, if there is exactly one.
    pub(super) fn sole_holder(&self) -> Option<&str> {
        match self.holders.len() {
            1 => self.holders.keys().next().map(String::as_str),
            _ => None,
        }
    }

    /// Whether `owner` may take this id in `mode` without conflict.
    ///
    /// Reads share with reads only. A write needs the record to be held by
    /// `owner` alone, in either mode.
    pub(super) fn admits(&self, owner: &str, mode: LockMode) -> bool {
        match mode {
            LockMode::Read => self.mode() == LockMode::Read,
            LockMode::Write => self.sole_holder() == Some(owner),
        }
    }

    /// Add one count of each of `claims`, in `mode`, for `owner`.
    pub(super) fn grant(
        &mut self,
        owner: &str,
        mode: LockMode,
        claims: impl IntoIterator<Item = Claim>,
    ) {
        let holds = self.holders.entry(owner.to_string()).or_default();
        for claim in claims {
            *holds.entry((mode, claim)).or_insert(0) += 1;
        }
    }

    /// Take back one count of `claim` granted to `owner` in `mode`. Returns
    /// true if there was one.
    pub(super) fn revoke(&mut self, owner: &str, mode: LockMode, claim: &Claim) -> bool {
        let Some(holds) = self.holders.get_mut(owner) else {
            return false;
        };

        let key = (mode, claim.clone());
        let Some(count) = holds.get_mut(&key) else {
            return false;
        };

        *count -= 1;
        if *count == 0 {
            holds.remove(&key);
        }
        if holds.is_empty() {
            self.holders.remove(owner);
        }
        true
    }

    /// Drop `owner` entirely. Returns true if it was a holder.
    pub(super) fn evict(&mut self, owner: &str) -> bool {
        self.holders.remove(owner).is_some()
    }

    /// Whether `owner` holds `id` (this record's id) in `mode` through a
    /// direct claim, as the root of its own tree lock, or, with
    /// `include_tree`, through any covering tree lock.
    pub(super) fn covers(&self, id: &str, owner: &str, mode: LockMode, include_tree: bool) -> bool {
        self.holders.get(owner).is_some_and(|holds| {
            holds
                .keys()
                .filter(|(hold_mode, _)| *hold_mode == mode)
                .any(|(_, claim)| match claim {
                    Claim::Direct => true,
                    Claim::Tree(root) => include_tree || root == id,
                })
        })
    }

    pub(super) fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// Check the record invariants.
    pub(super) fn check(&self) -> Result<(), String> {
        if self.holders.is_empty() {
            return Err("record has no holders".to_string());
        }

        for (owner, holds) in &self.holders {
            if holds.is_empty() {
                return Err(format!("holder '{}' has no claims", owner));
            }
            if holds.values().any(|&count| count == 0) {
                return Err(format!("holder '{}' has a zero hold count", owner));
            }
        }

        if self.mode() == LockMode::Write && self.holders.len() != 1 {
            return Err(format!(
                "write lock has {} holders: {}",
                self.holders.len(),
                self.holders.keys().cloned().collect::<Vec<_>>().join(", ")
            ));
        }

        Ok(())
    }

    pub(super) fn info(&self, id: &str) -> LockInfo {
        LockInfo {
            id: id.to_string(),
            mode: self.mode(),
            holders: self
                .holders
                .iter()
                .map(|(owner, holds)| {
                    let mut claims: Vec<Claim> =
                        holds.keys().map(|(_, claim)| claim.clone()).collect();
                    claims.sort();
                    claims.dedup();
                    HolderInfo {
                        owner: owner.clone(),
                        claims,
                    }
                })
                .collect(),
            acquired_at: self.acquired_at,
        }
    }
}
