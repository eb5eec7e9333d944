//! Lock audit events.
//!
//! Events are stored in NDJSON format (one JSON object per line) so a lock
//! history can be inspected or replayed after the fact. The coordinator itself
//! keeps no history; callers that want one append an event per operation.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (acquire, release, acquire_failed, ...)
//! - `owner`: the owner id the operation ran for
//! - `ids`: the object ids named by the operation
//! - `mode`: `read` or `write`, when the operation has one
//! - `tree`: whether the ids were tree roots
//! - `details`: freeform object with action-specific details
//!
//! ```no_run
//! use treelock::events::{LockEvent, EventAction, append_event};
//! use treelock::locks::LockMode;
//! use serde_json::json;
//!
//! let event = LockEvent::new(EventAction::Acquire, "alice")
//!     .with_ids(["scene1"])
//!     .with_mode(LockMode::Write)
//!     .with_details(json!({"attempts": 1}));
//! append_event("events.ndjson", &event)?;
//! # Ok::<(), treelock::error::TreelockError>(())
//! ```

use crate::error::{Result, TreelockError};
use crate::graph::ObjectId;
use crate::locks::LockMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Lock acquired
    Acquire,
    /// Lock could not be acquired
    AcquireFailed,
    /// Lock released
    Release,
    /// Lock assertion checked
    Assert,
    /// Lock state queried
    Query,
    /// Every lock of an owner dropped
    ReleaseOwner,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Acquire => write!(f, "acquire"),
            EventAction::AcquireFailed => write!(f, "acquire_failed"),
            EventAction::Release => write!(f, "release"),
            EventAction::Assert => write!(f, "assert"),
            EventAction::Query => write!(f, "query"),
            EventAction::ReleaseOwner => write!(f, "release_owner"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockEvent {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The owner the action ran for.
    pub owner: String,

    /// Object ids named by the action.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<ObjectId>,

    /// Lock mode, if the action has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<LockMode>,

    /// Whether `ids` were tree roots.
    #[serde(default)]
    pub tree: bool,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl LockEvent {
    /// Create a new event with the given action, timestamped now.
    pub fn new(action: EventAction, owner: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            action,
            owner: owner.into(),
            ids: Vec::new(),
            mode: None,
            tree: false,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ObjectId>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mode(mut self, mode: LockMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_tree(mut self, tree: bool) -> Self {
        self.tree = tree;
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            TreelockError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Owner string for the local user, `user@HOST`.
pub fn local_actor() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the events file at `path`.
///
/// The file (and its parent directory) is created if it doesn't exist. Each
/// append results in one line with a trailing newline.
pub fn append_event<P: AsRef<Path>>(path: P, event: &LockEvent) -> Result<()> {
    let path = path.as_ref();
    let json_line = event.to_ndjson_line()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            TreelockError::UserError(format!(
                "failed to create events directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            TreelockError::UserError(format!(
                "failed to open events file '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        TreelockError::UserError(format!(
            "failed to write event to '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read every event from an events file, oldest first.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<LockEvent>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        TreelockError::UserError(format!(
            "failed to read events file '{}': {}",
            path.display(),
            e
        ))
    })?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| {
                TreelockError::UserError(format!(
                    "invalid event on line {} of '{}': {}",
                    n + 1,
                    path.display(),
                    e
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_event_creation() {
        let event = LockEvent::new(EventAction::Acquire, "alice");

        assert_eq!(event.action, EventAction::Acquire);
        assert_eq!(event.owner, "alice");
        assert!(event.ids.is_empty());
        assert!(event.mode.is_none());
        assert!(!event.tree);
        assert!(event.details.is_object());
    }

    #[test]
    fn test_event_builder() {
        let event = LockEvent::new(EventAction::Release, "bob")
            .with_ids(["scene1"])
            .with_mode(LockMode::Read)
            .with_tree(true)
            .with_details(json!({"revoked": 3}));

        assert_eq!(event.ids, vec!["scene1"]);
        assert_eq!(event.mode, Some(LockMode::Read));
        assert!(event.tree);
        assert_eq!(event.details["revoked"], 3);
    }

    #[test]
    fn test_ndjson_line_is_single_line() {
        let event = LockEvent::new(EventAction::AcquireFailed, "alice")
            .with_ids(["obj1", "obj2"])
            .with_mode(LockMode::Write);
        let line = event.to_ndjson_line().unwrap();

        assert!(!line.contains('\n'));
        assert!(line.contains("\"action\":\"acquire_failed\""));
        assert!(line.contains("\"mode\":\"write\""));
    }

    #[test]
    fn test_action_display_matches_serde() {
        for action in [
            EventAction::Acquire,
            EventAction::AcquireFailed,
            EventAction::Release,
            EventAction::Assert,
            EventAction::Query,
            EventAction::ReleaseOwner,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action));
        }
    }

    #[test]
    fn test_append_and_read_events() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("audit").join("events.ndjson");

        append_event(&path, &LockEvent::new(EventAction::Acquire, "alice")).unwrap();
        append_event(&path, &LockEvent::new(EventAction::Release, "alice")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, EventAction::Acquire);
        assert_eq!(events[1].action, EventAction::Release);
    }

    #[test]
    fn test_read_events_reports_bad_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.ndjson");
        std::fs::write(&path, "{not json}\n").unwrap();

        let err = read_events(&path).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_local_actor_has_user_and_host() {
        let actor = local_actor();
        assert!(actor.contains('@'));
    }
}
