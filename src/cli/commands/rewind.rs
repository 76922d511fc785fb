//! Rewind command - move the working tree back to a checkpoint's commit.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::checkpoint::CheckpointStore;
use crate::cli::{current_repo, first_line, short_hash};

/// Arguments for the rewind command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    entire rewind --list                    Show checkpoints that can be restored\n    \
    entire rewind --to a3b2c4d5e6f7         Check out the checkpoint's commit\n    \
    entire rewind --to a3b2c4d5e6f7 --reset Discard local changes while doing so")]
pub struct Args {
    /// List checkpoints with an associated commit
    #[arg(long, conflicts_with = "to")]
    pub list: bool,

    /// Checkpoint ID to rewind to
    #[arg(long, value_name = "ID")]
    pub to: Option<String>,

    /// Overwrite local modifications
    #[arg(long, requires = "to")]
    pub reset: bool,
}

/// Lists rewind targets, or checks out the commit behind `--to`.
pub fn run(args: Args) -> Result<()> {
    let repo = current_repo()?;
    let store = CheckpointStore::for_repo(&repo);

    let Some(id) = args.to else {
        let checkpoints = store.list().context("Failed to list checkpoints")?;
        let targets: Vec<_> = checkpoints
            .iter()
            .filter(|c| !c.commit_hash.is_empty())
            .collect();

        if targets.is_empty() {
            println!("{}", "No checkpoints to rewind to.".dimmed());
            return Ok(());
        }
        for meta in targets {
            println!(
                "  {}  {}  {}",
                meta.id.yellow(),
                short_hash(&meta.commit_hash).cyan(),
                first_line(&meta.message)
            );
        }
        return Ok(());
    };

    let meta = store.get(&id)?;
    store
        .rewind(&repo.workdir(), &id, args.reset)
        .with_context(|| format!("Failed to rewind to checkpoint {id}"))?;

    println!(
        "Rewound to checkpoint {} (commit {})",
        id.yellow(),
        short_hash(&meta.commit_hash).cyan()
    );
    Ok(())
}
