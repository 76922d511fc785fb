//! Enable command - turn on checkpointing for the current repository.

use anyhow::{Context, Result};
use colored::Colorize;

use super::hooks;
use crate::cli::current_repo;
use crate::config::Config;
use crate::git::CHECKPOINTS_BRANCH;
use crate::strategy::canonical_name;

/// Arguments for the enable command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    entire enable                       Checkpoint on every commit\n    \
    entire enable --strategy auto       Also checkpoint after each agent response\n    \
    entire enable --force               Replace existing post-commit/pre-push hooks")]
pub struct Args {
    /// Capture strategy: manual-commit (or manual), auto-commit (or auto)
    #[arg(short, long, value_name = "NAME")]
    pub strategy: Option<String>,

    /// Overwrite existing git hooks (originals are kept as .backup)
    #[arg(long)]
    pub force: bool,
}

/// Writes the project settings, installs hooks and creates the
/// checkpoints branch.
pub fn run(args: Args) -> Result<()> {
    let strategy = args.strategy.as_deref().map(canonical_name).transpose()?;

    let repo = current_repo()?;
    let workdir = repo.workdir();

    Config::update_project(&workdir, |settings| {
        settings.enabled = Some(true);
        if let Some(name) = strategy {
            settings.strategy = Some(name.to_string());
        }
    })
    .context("Failed to update project settings")?;

    hooks::install_all(&repo, args.force)?;

    let created = repo
        .ensure_checkpoints_branch()
        .context("Failed to create checkpoints branch")?;
    if created {
        println!("  {} branch {}", "Created".green(), CHECKPOINTS_BRANCH.cyan());
    }

    let config = Config::load(&workdir)?;
    println!();
    println!(
        "Entire is {} (strategy: {})",
        "enabled".green().bold(),
        config.strategy.cyan()
    );
    Ok(())
}
