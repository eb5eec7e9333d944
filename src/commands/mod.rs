//! Command implementations for treelock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod replay;
mod tree;

use crate::cli::{Command, ConfigArgs};
use std::path::Path;
use treelock::config::Config;
use treelock::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Tree(args) => tree::cmd_tree(args),
        Command::Replay(args) => replay::cmd_replay(args),
        Command::Config(args) => cmd_config(args),
    }
}

/// Load the config file if one was given, else defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

fn cmd_config(args: ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    print!("{}", config.to_yaml()?);
    Ok(())
}
