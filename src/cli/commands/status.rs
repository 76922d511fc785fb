//! Status command - show checkpointing state for the current repository.

use anyhow::Result;
use colored::Colorize;

use super::hooks;
use crate::checkpoint::CheckpointStore;
use crate::cli::{current_repo, first_line};
use crate::config::Config;
use crate::git::CHECKPOINTS_BRANCH;

/// Number of checkpoints shown under "Recent checkpoints".
const RECENT_LIMIT: usize = 5;

/// Arguments for the status command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    entire status       Show whether checkpointing is on and recent checkpoints")]
pub struct Args {}

/// Prints enabled flag, strategy, branch, hook state and checkpoint count.
pub fn run(_args: Args) -> Result<()> {
    let repo = current_repo()?;
    let config = Config::load(&repo.workdir())?;

    println!("{}", "Entire".bold());
    println!();

    let enabled = if config.enabled && repo.has_checkpoints_branch() {
        "yes".green()
    } else {
        "no".yellow()
    };
    println!("  Enabled:     {}", enabled);
    println!("  Strategy:    {}", config.strategy.cyan());
    println!("  Branch:      {}", repo.current_branch()?);
    println!("  Hooks:       {}/2 installed", hooks::installed_count(&repo)?);

    if !repo.has_checkpoints_branch() {
        println!();
        println!(
            "{}",
            format!("No {CHECKPOINTS_BRANCH} branch. Run 'entire enable' to start.").dimmed()
        );
        return Ok(());
    }

    let store = CheckpointStore::for_repo(&repo);
    let checkpoints = store.list()?;
    println!("  Checkpoints: {}", checkpoints.len());

    if !checkpoints.is_empty() {
        println!();
        println!("{}", "Recent checkpoints:".bold());
        for meta in checkpoints.iter().take(RECENT_LIMIT) {
            println!(
                "  {}  {}  {}",
                meta.id.yellow(),
                meta.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                first_line(&meta.message)
            );
        }
    }

    Ok(())
}
