//! Clean command - delete leftover Entire shadow branches.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::current_repo;

/// Arguments for the clean command.
#[derive(clap::Args)]
pub struct Args {
    /// Show what would be deleted without deleting it
    #[arg(long)]
    pub dry_run: bool,
}

/// Deletes every `entire/` branch except the checkpoints branch.
pub fn run(args: Args) -> Result<()> {
    let repo = current_repo()?;
    let branches = repo
        .shadow_branches()
        .context("Failed to list shadow branches")?;

    if branches.is_empty() {
        println!("Nothing to clean.");
        return Ok(());
    }

    println!("Found {} shadow branch(es):", branches.len());
    for branch in &branches {
        println!("  {}", branch);
    }

    if args.dry_run {
        println!();
        println!("{}", "Dry run, no changes made.".dimmed());
        return Ok(());
    }

    let mut deleted = 0;
    for branch in &branches {
        match repo.delete_branch(branch) {
            Ok(()) => deleted += 1,
            Err(e) => tracing::warn!("Failed to delete {}: {}", branch, e),
        }
    }

    println!();
    println!("Deleted {} branch(es).", deleted.to_string().green());
    Ok(())
}
