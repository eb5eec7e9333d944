//! CLI argument parsing for treelock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Treelock: hierarchical read/write locks for shared scene graphs.
///
/// Inspect how tree locks expand over a graph and replay scripted lock
/// sessions of several owners against a fresh lock coordinator.
#[derive(Parser, Debug)]
#[command(name = "treelock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `TREELOCK_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for treelock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the ids a tree lock on ROOT would cover.
    Tree(TreeArgs),

    /// Replay a scripted lock session.
    ///
    /// Runs every step of the script in order, prints each outcome and
    /// finishes with the list of locks still held.
    Replay(ReplayArgs),

    /// Print the effective configuration.
    Config(ConfigArgs),
}

/// Arguments for the `tree` command.
#[derive(Parser, Debug)]
pub struct TreeArgs {
    /// Graph file (YAML).
    #[arg(short, long)]
    pub graph: PathBuf,

    /// Root object id.
    pub root: String,
}

/// Arguments for the `replay` command.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Graph file (YAML).
    #[arg(short, long)]
    pub graph: PathBuf,

    /// Script file (YAML) with the lock steps to run.
    #[arg(short, long)]
    pub script: PathBuf,

    /// Config file (YAML). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Append an audit event per step to this NDJSON file.
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Stop at the first failing step and exit with its error code.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the `config` command.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Config file (YAML). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
