//! Reset command - drop Entire's local state for a clean start.
//!
//! Shadow branches and `.entire/settings.local.yaml` are removed. The
//! checkpoints branch, the committed project settings and the installed
//! hooks are kept.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::cli::current_repo;
use crate::config::Config;

/// Arguments for the reset command.
#[derive(clap::Args)]
pub struct Args {
    /// Confirm the reset
    #[arg(long)]
    pub force: bool,
}

/// Deletes shadow branches and local settings once confirmed with `--force`.
pub fn run(args: Args) -> Result<()> {
    let repo = current_repo()?;
    let branches = repo
        .shadow_branches()
        .context("Failed to list shadow branches")?;
    let local_settings = Config::local_path(&repo.workdir());

    if !args.force {
        println!("This will delete all local Entire state:");
        println!("  {} shadow branch(es)", branches.len());
        if local_settings.exists() {
            println!("  {}", local_settings.display());
        }
        println!();
        println!("Use {} to confirm.", "--force".bold());
        return Ok(());
    }

    for branch in &branches {
        if let Err(e) = repo.delete_branch(branch) {
            tracing::warn!("Failed to delete {}: {}", branch, e);
        }
    }

    remove_if_present(&local_settings)?;

    println!("{}", "Entire state reset.".green());
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_if_present() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.local.yaml");

        remove_if_present(&path).unwrap();

        std::fs::write(&path, "enabled: false\n").unwrap();
        remove_if_present(&path).unwrap();
        assert!(!path.exists());
    }
}
