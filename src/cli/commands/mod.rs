//! CLI commands for Entire.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// List stored checkpoints.
pub mod checkpoints;

/// Delete leftover shadow branches.
pub mod clean;

/// Turn checkpointing off.
pub mod disable;

/// Turn checkpointing on for a repository.
pub mod enable;

/// Show a checkpoint and its transcript.
pub mod explain;

/// Hook entry points (hidden).
pub mod hook;

/// Install, remove and inspect git hooks.
pub mod hooks;

/// Delete shadow branches and local settings.
pub mod reset;

/// Check out a branch and show its last checkpoint.
pub mod resume;

/// Return the working tree to a checkpoint's commit.
pub mod rewind;

/// Show checkpointing state.
pub mod status;
