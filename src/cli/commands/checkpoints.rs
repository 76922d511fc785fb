//! Checkpoints command - list stored checkpoints, newest first.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::checkpoint::CheckpointStore;
use crate::cli::{current_repo, first_line, short_hash, OutputFormat};
use crate::storage::models::CheckpointMetadata;

/// Arguments for the checkpoints command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    entire checkpoints                  List the 20 most recent checkpoints\n    \
    entire checkpoints --limit 5        List the 5 most recent\n    \
    entire checkpoints --format json    Output as JSON")]
pub struct Args {
    /// Maximum number of checkpoints to show
    #[arg(short, long, default_value = "20", value_name = "N")]
    pub limit: usize,

    /// Output format: text (default) or json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Lists checkpoints from the checkpoints branch.
pub fn run(args: Args) -> Result<()> {
    let repo = current_repo()?;
    let store = CheckpointStore::for_repo(&repo);
    let mut checkpoints = store.list().context("Failed to list checkpoints")?;
    checkpoints.truncate(args.limit);

    args.format.print(&checkpoints, print_text)
}

fn print_text(checkpoints: &[CheckpointMetadata]) {
    if checkpoints.is_empty() {
        println!("{}", "No checkpoints found.".dimmed());
        println!(
            "{}",
            "Run 'entire enable', then commit while an agent session is active.".dimmed()
        );
        return;
    }

    println!(
        "{:<12}  {:<16}  {:<8}  {:>6}  {:<13}  MESSAGE",
        "ID", "CREATED", "COMMIT", "TOKENS", "STRATEGY"
    );
    for meta in checkpoints {
        let commit = if meta.commit_hash.is_empty() {
            "-"
        } else {
            short_hash(&meta.commit_hash)
        };
        println!(
            "{:<12}  {:<16}  {:<8}  {:>6}  {:<13}  {}",
            meta.id.yellow(),
            meta.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            commit.cyan(),
            meta.total_usage().total_tokens(),
            meta.strategy,
            first_line(&meta.message)
        );
    }
}
