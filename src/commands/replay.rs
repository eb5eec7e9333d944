//! `treelock replay`: run a scripted lock session.
//!
//! A script is a YAML list of steps, each performed by one owner:
//!
//! ```yaml
//! steps:
//!   - action: write_lock
//!     owner: alice
//!     ids: [scene1]
//!     tree: true
//!   - action: read_lock
//!     owner: bob
//!     ids: [obj1]
//!   - action: write_unlock
//!     owner: alice
//!     ids: [scene1]
//!     tree: true
//! ```
//!
//! Locks taken by a step stay held until a later unlock step (or the end of
//! the replay). Steps without an owner run as the local `user@HOST`.

use crate::cli::ReplayArgs;
use crate::commands::load_config;
use serde::Deserialize;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use treelock::error::{Result, TreelockError};
use treelock::events::{EventAction, LockEvent, append_event, local_actor};
use treelock::graph::{ObjectGraph, ObjectId, SceneGraph};
use treelock::locks::{LockCoordinator, LockMode, LockRequest};

/// A replay script.
#[derive(Debug, Default, Deserialize)]
struct Script {
    #[serde(default)]
    steps: Vec<Step>,
}

impl Script {
    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TreelockError::UserError(format!(
                "failed to read script file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| TreelockError::UserError(format!("failed to parse script YAML: {}", e)))
    }
}

/// One scripted operation.
#[derive(Debug, Clone, Deserialize)]
struct Step {
    action: StepAction,

    #[serde(default)]
    owner: Option<String>,

    #[serde(default)]
    ids: Vec<ObjectId>,

    #[serde(default)]
    tree: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StepAction {
    WriteLock,
    ReadLock,
    WriteUnlock,
    ReadUnlock,
    AssertWrite,
    AssertRead,
    Unlocked,
    ReleaseOwner,
}

impl StepAction {
    fn as_str(&self) -> &'static str {
        match self {
            StepAction::WriteLock => "write_lock",
            StepAction::ReadLock => "read_lock",
            StepAction::WriteUnlock => "write_unlock",
            StepAction::ReadUnlock => "read_unlock",
            StepAction::AssertWrite => "assert_write",
            StepAction::AssertRead => "assert_read",
            StepAction::Unlocked => "unlocked",
            StepAction::ReleaseOwner => "release_owner",
        }
    }

    fn mode(&self) -> Option<LockMode> {
        match self {
            StepAction::WriteLock | StepAction::WriteUnlock | StepAction::AssertWrite => {
                Some(LockMode::Write)
            }
            StepAction::ReadLock | StepAction::ReadUnlock | StepAction::AssertRead => {
                Some(LockMode::Read)
            }
            StepAction::Unlocked | StepAction::ReleaseOwner => None,
        }
    }

    fn event_action(&self, ok: bool) -> EventAction {
        match self {
            StepAction::WriteLock | StepAction::ReadLock if ok => EventAction::Acquire,
            StepAction::WriteLock | StepAction::ReadLock => EventAction::AcquireFailed,
            StepAction::WriteUnlock | StepAction::ReadUnlock => EventAction::Release,
            StepAction::AssertWrite | StepAction::AssertRead => EventAction::Assert,
            StepAction::Unlocked => EventAction::Query,
            StepAction::ReleaseOwner => EventAction::ReleaseOwner,
        }
    }
}

/// Step counts of a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ReplaySummary {
    succeeded: usize,
    failed: usize,
}

/// Runs script steps against one coordinator.
struct Replay<'a, G> {
    coordinator: &'a LockCoordinator<G>,
    default_owner: String,
    events: Option<&'a Path>,
}

impl<G: ObjectGraph> Replay<'_, G> {
    fn owner<'s>(&'s self, step: &'s Step) -> &'s str {
        step.owner.as_deref().unwrap_or(&self.default_owner)
    }

    /// Perform one step; the `Ok` text describes the outcome.
    fn run_step(&self, step: &Step) -> Result<String> {
        let owner = self.owner(step);
        if step.ids.is_empty() && step.action != StepAction::ReleaseOwner {
            return Err(TreelockError::EmptyRequest);
        }
        let request = LockRequest::new(owner, step.ids.iter().cloned()).with_tree(step.tree);

        match step.action {
            StepAction::WriteLock | StepAction::ReadLock => {
                let mode = step.action.mode().unwrap_or(LockMode::Read);
                self.coordinator.acquire(mode, &request)?.keep();
                Ok("locked".to_string())
            }
            StepAction::WriteUnlock | StepAction::ReadUnlock => {
                let mode = step.action.mode().unwrap_or(LockMode::Read);
                self.coordinator.release(mode, &request);
                Ok("released".to_string())
            }
            StepAction::AssertWrite => {
                for id in &step.ids {
                    self.coordinator.assert_write_locked(id, owner, step.tree)?;
                }
                Ok("write locked".to_string())
            }
            StepAction::AssertRead => {
                for id in &step.ids {
                    self.coordinator.assert_read_locked(id, owner, step.tree)?;
                }
                Ok("read locked".to_string())
            }
            StepAction::Unlocked => {
                let free = self.coordinator.ids_not_write_locked(&step.ids, owner);
                Ok(format!(
                    "free: {}",
                    free.into_iter().collect::<Vec<_>>().join(", ")
                ))
            }
            StepAction::ReleaseOwner => {
                let evicted = self.coordinator.release_owner(owner);
                Ok(format!("released {} locks", evicted))
            }
        }
    }

    fn record(&self, step: &Step, outcome: &Result<String>) -> Result<()> {
        let Some(path) = self.events else {
            return Ok(());
        };

        let details = match outcome {
            Ok(text) => json!({"ok": true, "outcome": text}),
            Err(e) => json!({"ok": false, "error": e.to_string(), "exit_code": e.exit_code()}),
        };
        let mut event = LockEvent::new(step.action.event_action(outcome.is_ok()), self.owner(step))
            .with_ids(step.ids.iter().cloned())
            .with_tree(step.tree)
            .with_details(details);
        if let Some(mode) = step.action.mode() {
            event = event.with_mode(mode);
        }

        append_event(path, &event)
    }

    /// Run every step, writing one line per step to `out`.
    fn run<W: Write>(
        &self,
        script: &Script,
        fail_fast: bool,
        out: &mut W,
    ) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();

        for (n, step) in script.steps.iter().enumerate() {
            let outcome = self.run_step(step);
            self.record(step, &outcome)?;

            let target = if step.tree {
                format!("tree [{}]", step.ids.join(", "))
            } else {
                format!("[{}]", step.ids.join(", "))
            };
            let result = match &outcome {
                Ok(text) => text.clone(),
                Err(e) => format!("FAILED: {}", e),
            };
            writeln!(
                out,
                "{:>3}. {} {} {}: {}",
                n + 1,
                self.owner(step),
                step.action.as_str(),
                target,
                result
            )
            .map_err(write_error)?;

            match outcome {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    summary.failed += 1;
                    if fail_fast {
                        return Err(e);
                    }
                }
            }
        }

        Ok(summary)
    }
}

fn write_error(e: std::io::Error) -> TreelockError {
    TreelockError::UserError(format!("failed to write output: {}", e))
}

pub fn cmd_replay(args: ReplayArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let graph = SceneGraph::load(&args.graph)?;
    let script = Script::load(&args.script)?;
    let coordinator = LockCoordinator::from_config(graph, &config);

    let replay = Replay {
        coordinator: &coordinator,
        default_owner: local_actor(),
        events: args.events.as_deref(),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = replay.run(&script, args.fail_fast, &mut out)?;

    writeln!(out).map_err(write_error)?;
    writeln!(
        out,
        "{} steps succeeded, {} failed.",
        summary.succeeded, summary.failed
    )
    .map_err(write_error)?;

    let locks = coordinator.locks();
    if locks.is_empty() {
        writeln!(out, "No active locks.").map_err(write_error)?;
    } else {
        writeln!(out, "Active locks ({}):", locks.len()).map_err(write_error)?;
        for lock in &locks {
            let stale = if lock.is_stale(config.lock_stale_minutes) {
                ", STALE"
            } else {
                ""
            };
            writeln!(out, "  {}{}", lock, stale).map_err(write_error)?;
        }
    }

    Ok(())
}
