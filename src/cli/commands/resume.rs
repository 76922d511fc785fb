//! Resume command - switch to a branch and show the session it came from.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::checkpoint::CheckpointStore;
use crate::cli::commands::explain::print_header;
use crate::cli::current_repo;
use crate::error::Error;
use crate::git::CHECKPOINTS_BRANCH;

/// Arguments for the resume command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    entire resume feature/login             Check out the branch and show its last checkpoint\n    \
    entire resume feature/login --force     Discard local changes while doing so")]
pub struct Args {
    /// Branch to check out
    pub branch: String,

    /// Overwrite local modifications
    #[arg(short, long)]
    pub force: bool,
}

/// Checks out `branch` and reports the most recent checkpoint on it.
pub fn run(args: Args) -> Result<()> {
    let repo = current_repo()?;
    let branch = args.branch;

    repo.checkout(&branch, args.force)
        .with_context(|| format!("Failed to check out branch {branch}"))?;

    let id = match repo.find_checkpoint_trailer(&branch) {
        Ok(id) => id,
        Err(Error::NoCheckpointTrailer(_)) => {
            println!(
                "Checked out {} {}",
                branch.green(),
                "(no Entire checkpoint found on this branch)".dimmed()
            );
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to scan branch history"),
    };

    println!("Resumed on branch {}", branch.green());
    println!();

    let store = CheckpointStore::for_repo(&repo);
    match store.get(&id) {
        Ok(meta) => print_header(&meta),
        Err(e) if e.is_not_found() => {
            println!("  Last checkpoint: {}", id.yellow());
            println!(
                "{}",
                format!("Checkpoint data is not available locally. Fetch {CHECKPOINTS_BRANCH} first.")
                    .dimmed()
            );
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read checkpoint {id}")),
    }

    Ok(())
}
