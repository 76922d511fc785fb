//! Explain command - show a checkpoint and the transcript behind it.

use anyhow::{bail, Context, Result};
use clap::ArgGroup;
use colored::Colorize;

use crate::checkpoint::CheckpointStore;
use crate::cli::{current_repo, first_line, short_hash};
use crate::storage::models::CheckpointMetadata;

/// Arguments for the explain command.
#[derive(clap::Args)]
#[command(group(ArgGroup::new("target").required(true).args(["checkpoint", "commit"])))]
#[command(after_help = "EXAMPLES:\n    \
    entire explain --commit HEAD            Checkpoint recorded on the last commit\n    \
    entire explain --checkpoint a3b2c4d5e6f7\n    \
    entire explain --commit HEAD --raw      Print the raw JSONL transcript")]
pub struct Args {
    /// Checkpoint ID (12 hex characters)
    #[arg(long, value_name = "ID")]
    pub checkpoint: Option<String>,

    /// Commit whose Entire-Checkpoint trailer names the checkpoint
    #[arg(long, value_name = "REV")]
    pub commit: Option<String>,

    /// Print the raw transcript instead of the rendered context
    #[arg(long)]
    pub raw: bool,

    /// Session index within the checkpoint
    #[arg(long, default_value = "0", value_name = "N")]
    pub session: usize,
}

/// Prints checkpoint metadata followed by one session's transcript.
pub fn run(args: Args) -> Result<()> {
    let repo = current_repo()?;

    let (id, linked_commit) = match (args.checkpoint, args.commit) {
        (Some(id), _) => (id, None),
        (None, Some(rev)) => {
            let id = repo
                .checkpoint_from_commit(&rev)
                .with_context(|| format!("Commit {rev} is not linked to a checkpoint"))?;
            (id, Some(repo.commit_hash(&rev)?))
        }
        (None, None) => bail!("Either --checkpoint or --commit is required"),
    };

    let store = CheckpointStore::for_repo(&repo);
    let meta = store.get(&id)?;
    print_header(&meta);

    if let Some(hash) = linked_commit.filter(|h| is_rewritten(&meta, h)) {
        println!();
        println!(
            "{}",
            format!(
                "Recorded at {} before the trailer was added; the tagged commit is {}.",
                short_hash(&meta.commit_hash),
                short_hash(&hash)
            )
            .dimmed()
        );
    }

    if args.session >= meta.sessions.len() {
        bail!(
            "Checkpoint {} has {} session(s); --session {} is out of range",
            id,
            meta.sessions.len(),
            args.session
        );
    }

    let transcript = if args.raw {
        store.raw_transcript(&id, args.session)?
    } else {
        store.formatted_transcript(&id, args.session)?
    };

    println!();
    println!("{}", String::from_utf8_lossy(&transcript));
    Ok(())
}

/// True when the commit carrying the trailer is not the one the checkpoint
/// recorded, which happens once the trailer amend rewrites it.
fn is_rewritten(meta: &CheckpointMetadata, tagged_commit: &str) -> bool {
    !meta.commit_hash.is_empty() && meta.commit_hash != tagged_commit
}

/// Prints checkpoint metadata and its session list.
pub(crate) fn print_header(meta: &CheckpointMetadata) {
    println!("{} {}", "Checkpoint".bold(), meta.id.yellow());
    println!();
    if !meta.commit_hash.is_empty() {
        println!("  Commit:    {}", short_hash(&meta.commit_hash).cyan());
    }
    println!("  Branch:    {}", meta.branch);
    println!("  Author:    {}", meta.author);
    println!("  Created:   {}", meta.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Strategy:  {}", meta.strategy);
    println!("  Message:   {}", first_line(&meta.message));

    if let Some(a) = meta.attribution {
        println!(
            "  Attribution: {:.0}% agent ({}/{} lines)",
            a.agent_percent, a.agent_lines, a.total_lines
        );
    }

    println!();
    println!("{}", "Sessions:".bold());
    for session in &meta.sessions {
        let usage = session.token_usage;
        println!(
            "  [{}] {} {}  ({} in / {} out, {} API calls)",
            session.index,
            session.agent_name.cyan(),
            session.session_id.dimmed(),
            usage.input_tokens,
            usage.output_tokens,
            usage.api_calls
        );
    }
}
