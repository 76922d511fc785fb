//! Disable command - stop creating checkpoints.
//!
//! Existing checkpoints stay on the checkpoints branch.

use anyhow::{Context, Result};
use colored::Colorize;

use super::hooks;
use crate::cli::current_repo;
use crate::config::Config;

/// Arguments for the disable command.
#[derive(clap::Args)]
pub struct Args {}

/// Removes the managed hooks and sets `enabled: false` in project settings.
pub fn run(_args: Args) -> Result<()> {
    let repo = current_repo()?;

    hooks::uninstall_all(&repo)?;
    Config::update_project(&repo.workdir(), |settings| settings.enabled = Some(false))
        .context("Failed to update project settings")?;

    println!();
    println!("Entire is {}", "disabled".yellow().bold());
    println!(
        "{}",
        "Existing checkpoints are kept. Run 'entire enable' to resume.".dimmed()
    );
    Ok(())
}
