//! Hidden `hook` command invoked by git hooks and agent hooks.
//!
//! Every event is routed to the strategy named in the configuration. When
//! Entire is disabled the command exits successfully without doing anything.

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::capture::default_registry;
use crate::cli::current_repo;
use crate::config::Config;
use crate::strategy::{new_strategy, AgentResponseEvent, CommitEvent, PushEvent};

/// Events delivered by hooks.
#[derive(Subcommand)]
pub enum HookCommand {
    /// A commit was just created.
    PostCommit,
    /// A push is about to start.
    PrePush {
        /// Remote being pushed to
        remote: Option<String>,
    },
    /// An agent finished responding.
    AgentResponse {
        /// Agent name (defaults to the configured agent)
        #[arg(long)]
        agent: Option<String>,

        /// Agent session ID
        #[arg(long)]
        session: String,
    },
}

/// Arguments for the hook command.
#[derive(clap::Args)]
pub struct Args {
    #[command(subcommand)]
    pub command: HookCommand,
}

/// Dispatches one hook event to the configured strategy.
pub fn run(args: Args) -> Result<()> {
    let repo = current_repo()?;
    let workdir = repo.workdir();
    let config = Config::load(&workdir)?;

    if !config.enabled {
        tracing::debug!("Entire is disabled, ignoring hook");
        return Ok(());
    }

    let registry = default_registry();
    let strategy = new_strategy(&config.strategy, &workdir, &registry)?;
    tracing::debug!("Dispatching hook to {}", strategy.name());

    match args.command {
        HookCommand::PostCommit => {
            let created = strategy
                .on_commit(&CommitEvent::default())
                .context("post-commit handling failed")?;
            if let Some(id) = created {
                tracing::info!("Checkpoint {} created for commit", id);
            }
        }
        HookCommand::PrePush { remote } => {
            let event = PushEvent {
                remote: remote.unwrap_or_default(),
                branch: repo.current_branch().unwrap_or_default(),
            };
            strategy.on_push(&event).context("pre-push handling failed")?;
        }
        HookCommand::AgentResponse { agent, session } => {
            let event = AgentResponseEvent {
                agent_name: agent.unwrap_or(config.agent),
                session_id: session,
            };
            let created = strategy
                .on_agent_response(&event)
                .context("agent-response handling failed")?;
            if let Some(id) = created {
                tracing::info!("Checkpoint {} created for {}", id, event.session_id);
            }
        }
    }

    Ok(())
}
