//! Lock type definitions and information structures.

use crate::graph::ObjectId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Opaque identifier of the client or session requesting a lock.
pub type OwnerId = String;

/// Claims to apply per object id in one acquisition.
pub type ClaimSet = BTreeMap<ObjectId, BTreeSet<Claim>>;

/// Lock mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// Shared lock, any number of holders.
    Read,
    /// Exclusive lock, exactly one holder.
    Write,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::Read => "read",
            LockMode::Write => "write",
        }
    }
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an owner holds a given id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Claim {
    /// The id itself was requested.
    Direct,
    /// The id is covered by a tree lock rooted at the given id.
    Tree(ObjectId),
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Claim::Direct => f.write_str("direct"),
            Claim::Tree(root) => write!(f, "tree:{}", root),
        }
    }
}

/// One owner's share of a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderInfo {
    pub owner: OwnerId,
    pub claims: Vec<Claim>,
}

/// Information about an active lock, detached from the table.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The locked object.
    pub id: ObjectId,

    /// The lock mode.
    pub mode: LockMode,

    /// Holders sorted by owner id.
    pub holders: Vec<HolderInfo>,

    /// When the record was created.
    pub acquired_at: DateTime<Utc>,
}

impl LockInfo {
    /// Calculate the age of the lock.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.acquired_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }

    /// Check if the lock is stale based on the given threshold in minutes.
    pub fn is_stale(&self, stale_minutes: u32) -> bool {
        self.age().num_minutes() > i64::from(stale_minutes)
    }

    /// Owner ids only.
    pub fn owners(&self) -> BTreeSet<&str> {
        self.holders.iter().map(|h| h.owner.as_str()).collect()
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let holders = self
            .holders
            .iter()
            .map(|h| {
                let claims = h
                    .claims
                    .iter()
                    .map(Claim::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}[{}]", h.owner, claims)
            })
            .collect::<Vec<_>>()
            .join(" ");

        write!(
            f,
            "{} ({}, holders: {}, age: {})",
            self.id,
            self.mode,
            holders,
            self.age_string()
        )
    }
}
