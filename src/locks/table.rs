//! The lock table: who holds which object, in which mode.

use super::record::LockRecord;
use super::types::{Claim, ClaimSet, LockInfo, LockMode};
use crate::error::{Result, TreelockError};
use crate::graph::ObjectId;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Authoritative lock state for every object id.
///
/// Every operation runs under one mutex covering the whole table, so a
/// multi-id acquisition is checked and applied as a single step. Operations
/// never wait for other owners; they succeed or fail immediately.
#[derive(Debug, Default)]
pub struct LockTable {
    records: Mutex<HashMap<ObjectId, LockRecord>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<ObjectId, LockRecord>> {
        // Mutations commit only after validation, so a poisoned table is consistent.
        self.records
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Take `mode` on every id in `claims` for `owner`, or on none of them.
    ///
    /// Returns `Ok(false)` if any id conflicts; the table is then unchanged.
    /// `Err` means a staged record broke an invariant, which is a bug; nothing
    /// is committed in that case either.
    pub fn try_acquire(&self, claims: &ClaimSet, owner: &str, mode: LockMode) -> Result<bool> {
        let mut records = self.records();

        let conflict = claims.keys().find(|id| {
            records
                .get(id.as_str())
                .is_some_and(|record| !record.admits(owner, mode))
        });
        if let Some(id) = conflict {
            tracing::trace!(owner, %mode, id = %id, "lock conflict");
            return Ok(false);
        }

        let now = Utc::now();
        let mut staged = Vec::with_capacity(claims.len());
        for (id, id_claims) in claims {
            let mut record = records
                .get(id)
                .cloned()
                .unwrap_or_else(|| LockRecord::new(now));
            record.grant(owner, mode, id_claims.iter().cloned());
            record.check().map_err(|reason| {
                TreelockError::InvariantViolation(format!("{}: {}", id, reason))
            })?;
            staged.push((id.clone(), record));
        }

        records.extend(staged);
        Ok(true)
    }

    /// Give up one `mode` hold of `owner` on each of `ids`.
    ///
    /// With `tree`, each id is treated as a tree root and one count of every
    /// claim made through that root in `mode` is revoked, wherever it sits in
    /// the table. Holds are counted: each successful acquisition needs one
    /// release. Holds the owner does not have, or has only in the other mode,
    /// are left alone, so releasing more often than acquiring is harmless.
    /// A repeated id counts once, as it does on acquisition. Returns the
    /// number of holds revoked.
    pub fn release<'a, I>(&self, ids: I, owner: &str, mode: LockMode, tree: bool) -> usize
    where
        I: IntoIterator<Item = &'a ObjectId>,
    {
        let ids: BTreeSet<&ObjectId> = ids.into_iter().collect();
        let mut records = self.records();
        let mut revoked = 0;

        for id in ids {
            if tree {
                let claim = Claim::Tree(id.clone());
                for record in records.values_mut() {
                    if record.revoke(owner, mode, &claim) {
                        revoked += 1;
                    }
                }
            } else if let Some(record) = records.get_mut(id)
                && record.revoke(owner, mode, &Claim::Direct)
            {
                revoked += 1;
            }
        }

        records.retain(|_, record| !record.is_empty());
        revoked
    }

    /// Drop every hold of `owner`. Returns how many records it left.
    pub fn release_owner(&self, owner: &str) -> usize {
        let mut records = self.records();
        let evicted = records
            .values_mut()
            .map(|record| record.evict(owner))
            .filter(|&evicted| evicted)
            .count();
        records.retain(|_, record| !record.is_empty());
        evicted
    }

    /// Whether `owner` holds `mode` on `id`, directly or, with
    /// `include_tree`, through a tree lock covering it.
    pub fn is_locked(&self, id: &str, owner: &str, mode: LockMode, include_tree: bool) -> bool {
        self.records()
            .get(id)
            .is_some_and(|record| {
                record.mode() == mode && record.covers(id, owner, mode, include_tree)
            })
    }

    /// The ids that nobody but `owner` has write-locked.
    pub fn unlocked_subset<'a, I>(&self, ids: I, owner: &str) -> BTreeSet<ObjectId>
    where
        I: IntoIterator<Item = &'a ObjectId>,
    {
        let records = self.records();
        ids.into_iter()
            .filter(|id| match records.get(id.as_str()) {
                Some(record) if record.mode() == LockMode::Write => {
                    record.holders.contains_key(owner)
                }
                _ => true,
            })
            .cloned()
            .collect()
    }

    /// All active locks, sorted by object id.
    pub fn snapshot(&self) -> Vec<LockInfo> {
        let mut locks: Vec<LockInfo> = self
            .records()
            .iter()
            .map(|(id, record)| record.info(id))
            .collect();
        locks.sort_by(|a, b| a.id.cmp(&b.id));
        locks
    }

    /// Active locks older than `stale_minutes`.
    pub fn stale(&self, stale_minutes: u32) -> Vec<LockInfo> {
        self.snapshot()
            .into_iter()
            .filter(|info| info.is_stale(stale_minutes))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct(ids: &[&str]) -> ClaimSet {
        ids.iter()
            .map(|id| (id.to_string(), BTreeSet::from([Claim::Direct])))
            .collect()
    }

    fn ids(list: &[&str]) -> Vec<ObjectId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn write_lock_is_exclusive() {
        let table = LockTable::new();

        assert!(table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap());
        assert!(!table.try_acquire(&direct(&["a"]), "bob", LockMode::Write).unwrap());
        assert!(!table.try_acquire(&direct(&["a"]), "bob", LockMode::Read).unwrap());
        assert!(table.is_locked("a", "alice", LockMode::Write, false));
        assert!(!table.is_locked("a", "bob", LockMode::Write, false));
    }

    #[test]
    fn read_locks_are_shared() {
        let table = LockTable::new();

        assert!(table.try_acquire(&direct(&["a"]), "alice", LockMode::Read).unwrap());
        assert!(table.try_acquire(&direct(&["a"]), "bob", LockMode::Read).unwrap());

        let locks = table.snapshot();
        assert_eq!(locks.len(), 1);
        assert_eq!(locks[0].owners(), BTreeSet::from(["alice", "bob"]));
    }

    #[test]
    fn shared_read_blocks_write_even_for_a_holder() {
        let table = LockTable::new();
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Read).unwrap();
        table.try_acquire(&direct(&["a"]), "bob", LockMode::Read).unwrap();

        assert!(!table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap());
    }

    #[test]
    fn sole_reader_can_upgrade_to_write() {
        let table = LockTable::new();
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Read).unwrap();

        assert!(table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap());
        assert!(table.is_locked("a", "alice", LockMode::Write, false));
        assert!(!table.is_locked("a", "alice", LockMode::Read, false));
    }

    #[test]
    fn writer_may_reacquire_write() {
        let table = LockTable::new();
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap();

        assert!(table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn failed_multi_id_acquire_has_no_effect() {
        let table = LockTable::new();
        table.try_acquire(&direct(&["b"]), "bob", LockMode::Write).unwrap();

        assert!(!table.try_acquire(&direct(&["a", "b", "c"]), "alice", LockMode::Write).unwrap());
        assert!(!table.is_locked("a", "alice", LockMode::Write, false));
        assert!(!table.is_locked("c", "alice", LockMode::Write, false));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let table = LockTable::new();
        let a = ids(&["a"]);
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap();

        assert_eq!(table.release(&a, "alice", LockMode::Write, false), 1);
        assert_eq!(table.release(&a, "alice", LockMode::Write, false), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn release_ignores_other_mode_and_other_owner() {
        let table = LockTable::new();
        let a = ids(&["a"]);
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap();

        assert_eq!(table.release(&a, "alice", LockMode::Read, false), 0);
        assert_eq!(table.release(&a, "bob", LockMode::Write, false), 0);
        assert!(table.is_locked("a", "alice", LockMode::Write, false));
    }

    #[test]
    fn release_of_one_reader_keeps_the_others() {
        let table = LockTable::new();
        let a = ids(&["a"]);
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Read).unwrap();
        table.try_acquire(&direct(&["a"]), "bob", LockMode::Read).unwrap();

        table.release(&a, "alice", LockMode::Read, false);

        assert!(!table.is_locked("a", "alice", LockMode::Read, false));
        assert!(table.is_locked("a", "bob", LockMode::Read, false));
    }

    #[test]
    fn tree_claims_are_visible_only_with_include_tree() {
        let table = LockTable::new();
        let claims: ClaimSet = ["root", "child"]
            .iter()
            .map(|id| (id.to_string(), BTreeSet::from([Claim::Tree("root".to_string())])))
            .collect();
        table.try_acquire(&claims, "alice", LockMode::Write).unwrap();

        assert!(table.is_locked("root", "alice", LockMode::Write, false));
        assert!(!table.is_locked("child", "alice", LockMode::Write, false));
        assert!(table.is_locked("child", "alice", LockMode::Write, true));

        table.release(&ids(&["root"]), "alice", LockMode::Write, true);
        assert!(table.is_empty());
    }

    #[test]
    fn direct_and_tree_claims_are_released_separately() {
        let table = LockTable::new();
        table.try_acquire(&direct(&["child"]), "alice", LockMode::Read).unwrap();
        let tree: ClaimSet = ["root", "child"]
            .iter()
            .map(|id| (id.to_string(), BTreeSet::from([Claim::Tree("root".to_string())])))
            .collect();
        table.try_acquire(&tree, "alice", LockMode::Read).unwrap();

        table.release(&ids(&["root"]), "alice", LockMode::Read, true);

        assert!(table.is_locked("child", "alice", LockMode::Read, false));
        assert!(!table.is_locked("root", "alice", LockMode::Read, true));
    }

    #[test]
    fn unlocked_subset_skips_foreign_writes_only() {
        let table = LockTable::new();
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap();
        table.try_acquire(&direct(&["b"]), "bob", LockMode::Write).unwrap();
        table.try_acquire(&direct(&["c"]), "bob", LockMode::Read).unwrap();

        let free = table.unlocked_subset(&ids(&["a", "b", "c", "d"]), "alice");
        let expected: BTreeSet<ObjectId> = ids(&["a", "c", "d"]).into_iter().collect();
        assert_eq!(free, expected);
    }

    #[test]
    fn release_owner_drops_every_hold() {
        let table = LockTable::new();
        table.try_acquire(&direct(&["a", "b"]), "alice", LockMode::Write).unwrap();
        table.try_acquire(&direct(&["c"]), "alice", LockMode::Read).unwrap();
        table.try_acquire(&direct(&["c"]), "bob", LockMode::Read).unwrap();

        assert_eq!(table.release_owner("alice"), 3);
        assert_eq!(table.len(), 1);
        assert!(table.is_locked("c", "bob", LockMode::Read, false));
    }

    fn tree_claims(root: &str, ids: &[&str]) -> ClaimSet {
        ids.iter()
            .map(|id| (id.to_string(), BTreeSet::from([Claim::Tree(root.to_string())])))
            .collect()
    }

    #[test]
    fn releasing_read_tree_and_write_upgrade_empties_the_table() {
        let table = LockTable::new();
        let subtree = tree_claims("root", &["root", "child"]);
        assert!(table.try_acquire(&subtree, "alice", LockMode::Read).unwrap());
        assert!(table.try_acquire(&direct(&["child"]), "alice", LockMode::Write).unwrap());
        assert!(table.is_locked("child", "alice", LockMode::Write, false));

        assert_eq!(table.release(&ids(&["child"]), "alice", LockMode::Write, false), 1);
        assert!(table.is_locked("child", "alice", LockMode::Read, true));
        assert!(table.try_acquire(&direct(&["child"]), "bob", LockMode::Read).unwrap());
        table.release(&ids(&["child"]), "bob", LockMode::Read, false);

        assert_eq!(table.release(&ids(&["root"]), "alice", LockMode::Read, true), 2);
        assert_eq!(table.release(&ids(&["child"]), "alice", LockMode::Read, false), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn reentrant_acquire_needs_matching_releases() {
        let table = LockTable::new();
        let a = ids(&["a"]);
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap();
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap();

        assert_eq!(table.release(&a, "alice", LockMode::Write, false), 1);
        assert!(table.is_locked("a", "alice", LockMode::Write, false));
        assert!(!table.try_acquire(&direct(&["a"]), "bob", LockMode::Write).unwrap());

        assert_eq!(table.release(&a, "alice", LockMode::Write, false), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn upgrade_release_keeps_the_read_hold() {
        let table = LockTable::new();
        let a = ids(&["a"]);
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Read).unwrap();
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap();

        table.release(&a, "alice", LockMode::Write, false);

        assert!(table.is_locked("a", "alice", LockMode::Read, false));
        assert_eq!(table.snapshot()[0].mode, LockMode::Read);
    }

    #[test]
    fn repeated_id_in_release_counts_once() {
        let table = LockTable::new();
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Read).unwrap();
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Read).unwrap();

        assert_eq!(table.release(&ids(&["a", "a"]), "alice", LockMode::Read, false), 1);
        assert!(table.is_locked("a", "alice", LockMode::Read, false));
    }

    #[test]
    fn fresh_locks_are_not_stale() {
        let table = LockTable::new();
        table.try_acquire(&direct(&["a"]), "alice", LockMode::Write).unwrap();

        assert!(table.stale(1).is_empty());
        assert_eq!(table.snapshot()[0].age_string(), "0m");
    }
}
