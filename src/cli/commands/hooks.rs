//! Git hooks management command.
//!
//! Installs the `post-commit` and `pre-push` hooks that forward git events
//! to `entire hook`. `enable` and `disable` reuse the install and uninstall
//! routines here.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::cli::current_repo;
use crate::git::Repository;

/// Marker comment identifying hooks written by Entire.
const HOOK_MARKER: &str = "# managed by entire";

const POST_COMMIT_HOOK: &str = r#"#!/bin/sh
# Entire post-commit hook: checkpoint the agent session for this commit
# managed by entire

if [ "$ENTIRE_ENABLED" = "false" ] || [ "$ENTIRE_ENABLED" = "0" ]; then
    exit 0
fi

if command -v entire >/dev/null 2>&1; then
    entire hook post-commit || true
fi
"#;

const PRE_PUSH_HOOK: &str = r#"#!/bin/sh
# Entire pre-push hook
# managed by entire

if [ "$ENTIRE_ENABLED" = "false" ] || [ "$ENTIRE_ENABLED" = "0" ]; then
    exit 0
fi

if command -v entire >/dev/null 2>&1; then
    entire hook pre-push "$1" || true
fi
"#;

/// Hook types that Entire manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
    PostCommit,
    PrePush,
}

impl HookType {
    fn filename(&self) -> &'static str {
        match self {
            HookType::PostCommit => "post-commit",
            HookType::PrePush => "pre-push",
        }
    }

    fn content(&self) -> &'static str {
        match self {
            HookType::PostCommit => POST_COMMIT_HOOK,
            HookType::PrePush => PRE_PUSH_HOOK,
        }
    }

    fn all() -> &'static [HookType] {
        &[HookType::PostCommit, HookType::PrePush]
    }
}

/// Subcommands for the hooks command.
#[derive(Subcommand)]
pub enum HooksCommand {
    /// Install git hooks in the current repository.
    Install {
        /// Overwrite existing hooks (originals are kept as .backup).
        #[arg(long)]
        force: bool,
    },
    /// Uninstall Entire git hooks, restoring any backed-up originals.
    Uninstall,
    /// Show status of installed hooks.
    Status,
}

/// Arguments for the hooks command.
#[derive(clap::Args)]
pub struct Args {
    #[command(subcommand)]
    pub command: HooksCommand,
}

/// Executes the hooks command.
pub fn run(args: Args) -> Result<()> {
    let repo = current_repo()?;
    match args.command {
        HooksCommand::Install { force } => install_all(&repo, force),
        HooksCommand::Uninstall => uninstall_all(&repo),
        HooksCommand::Status => print_status(&repo),
    }
}

/// Installs every managed hook and reports what happened.
pub fn install_all(repo: &Repository, force: bool) -> Result<()> {
    let hooks_dir = hooks_dir(repo)?;
    println!("Installing hooks in {}", hooks_dir.display());

    let mut skipped = 0;
    for hook_type in HookType::all() {
        let hook_path = hooks_dir.join(hook_type.filename());
        match install_hook(&hook_path, *hook_type, force)? {
            InstallStatus::Installed => {
                println!("  {} {}", "Installed".green(), hook_type.filename());
            }
            InstallStatus::Replaced => {
                println!(
                    "  {} {} (backed up existing to {}.backup)",
                    "Replaced".yellow(),
                    hook_type.filename(),
                    hook_type.filename()
                );
            }
            InstallStatus::Skipped => {
                println!(
                    "  {} {} (existing hook, use --force to overwrite)",
                    "Skipped".yellow(),
                    hook_type.filename()
                );
                skipped += 1;
            }
            InstallStatus::Updated => {
                println!("  {} {}", "Updated".dimmed(), hook_type.filename());
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("{} hook(s) left untouched", skipped);
    }
    Ok(())
}

/// Removes every Entire hook, restoring backups.
pub fn uninstall_all(repo: &Repository) -> Result<()> {
    let hooks_dir = hooks_dir(repo)?;
    println!("Removing hooks from {}", hooks_dir.display());

    for hook_type in HookType::all() {
        let hook_path = hooks_dir.join(hook_type.filename());
        match uninstall_hook(&hook_path)? {
            UninstallStatus::NotInstalled => {
                println!("  {} {} (not installed)", "Skipped".dimmed(), hook_type.filename());
            }
            UninstallStatus::NotManaged => {
                println!(
                    "  {} {} (not an Entire hook)",
                    "Skipped".yellow(),
                    hook_type.filename()
                );
            }
            UninstallStatus::Removed => {
                println!("  {} {}", "Removed".green(), hook_type.filename());
            }
            UninstallStatus::Restored => {
                println!(
                    "  {} {} (restored from backup)",
                    "Removed".green(),
                    hook_type.filename()
                );
            }
        }
    }
    Ok(())
}

fn print_status(repo: &Repository) -> Result<()> {
    let hooks_dir = hooks_dir(repo)?;

    println!("Git hooks status:");
    println!();
    for hook_type in HookType::all() {
        let status_str = match hook_status(&hooks_dir.join(hook_type.filename()))? {
            HookStatus::Managed => "installed".green().to_string(),
            HookStatus::Other => "other hook installed".yellow().to_string(),
            HookStatus::None => "not installed".dimmed().to_string(),
        };
        println!("  {:<14} {}", format!("{}:", hook_type.filename()), status_str);
    }
    Ok(())
}

/// Number of managed hooks currently installed.
pub fn installed_count(repo: &Repository) -> Result<usize> {
    let hooks_dir = hooks_dir(repo)?;
    let mut count = 0;
    for hook_type in HookType::all() {
        if matches!(hook_status(&hooks_dir.join(hook_type.filename()))?, HookStatus::Managed) {
            count += 1;
        }
    }
    Ok(count)
}

enum InstallStatus {
    Installed,
    Replaced,
    Skipped,
    /// An Entire hook was already there and has been rewritten.
    Updated,
}

fn install_hook(hook_path: &Path, hook_type: HookType, force: bool) -> Result<InstallStatus> {
    if !hook_path.exists() {
        write_hook(hook_path, hook_type)?;
        return Ok(InstallStatus::Installed);
    }

    let existing = fs::read_to_string(hook_path)
        .with_context(|| format!("Failed to read existing hook: {}", hook_path.display()))?;

    if existing.contains(HOOK_MARKER) {
        write_hook(hook_path, hook_type)?;
        return Ok(InstallStatus::Updated);
    }

    if !force {
        return Ok(InstallStatus::Skipped);
    }

    let backup_path = hook_path.with_extension("backup");
    fs::rename(hook_path, &backup_path)
        .with_context(|| format!("Failed to backup hook to {}", backup_path.display()))?;
    write_hook(hook_path, hook_type)?;
    Ok(InstallStatus::Replaced)
}

/// Writes a hook script and sets the executable bit on Unix.
fn write_hook(hook_path: &Path, hook_type: HookType) -> Result<()> {
    fs::write(hook_path, hook_type.content())
        .with_context(|| format!("Failed to write hook: {}", hook_path.display()))?;

    #[cfg(unix)]
    {
        let mut perms = fs::metadata(hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(hook_path, perms)
            .with_context(|| format!("Failed to set permissions on {}", hook_path.display()))?;
    }

    Ok(())
}

enum UninstallStatus {
    NotInstalled,
    NotManaged,
    Removed,
    Restored,
}

fn uninstall_hook(hook_path: &Path) -> Result<UninstallStatus> {
    match hook_status(hook_path)? {
        HookStatus::None => return Ok(UninstallStatus::NotInstalled),
        HookStatus::Other => return Ok(UninstallStatus::NotManaged),
        HookStatus::Managed => {}
    }

    fs::remove_file(hook_path)
        .with_context(|| format!("Failed to remove hook: {}", hook_path.display()))?;

    let backup_path = hook_path.with_extension("backup");
    if backup_path.exists() {
        fs::rename(&backup_path, hook_path)
            .with_context(|| format!("Failed to restore backup: {}", backup_path.display()))?;
        return Ok(UninstallStatus::Restored);
    }
    Ok(UninstallStatus::Removed)
}

enum HookStatus {
    Managed,
    Other,
    None,
}

fn hook_status(hook_path: &Path) -> Result<HookStatus> {
    if !hook_path.exists() {
        return Ok(HookStatus::None);
    }

    let content = fs::read_to_string(hook_path)
        .with_context(|| format!("Failed to read hook: {}", hook_path.display()))?;

    if content.contains(HOOK_MARKER) {
        Ok(HookStatus::Managed)
    } else {
        Ok(HookStatus::Other)
    }
}

/// `<git-dir>/hooks`, created if missing.
fn hooks_dir(repo: &Repository) -> Result<PathBuf> {
    let hooks_dir = repo.git_dir().join("hooks");
    if !hooks_dir.exists() {
        fs::create_dir_all(&hooks_dir)
            .with_context(|| format!("Failed to create hooks directory: {}", hooks_dir.display()))?;
    }
    Ok(hooks_dir)
}
