//! Command-line interface for Entire.
//!
//! Commands enable and disable checkpointing for a repository, inspect
//! stored checkpoints, and receive the events fired by git hooks and agent
//! hooks.

use anyhow::{Context, Result};

use crate::git::Repository;

/// Individual CLI command implementations.
pub mod commands;

mod format;

pub use format::OutputFormat;

/// Opens the repository containing the current directory.
pub fn current_repo() -> Result<Repository> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Repository::open(&cwd)
        .context("Not in a git repository. Run this command from within a git repository.")
}

/// First 8 characters of a commit hash.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

/// Subject line of a commit message.
pub fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}
