//! Capture strategies.
//!
//! A strategy decides when checkpoints are produced: on commits only
//! ([`ManualCommit`]) or additionally after every agent response
//! ([`AutoCommit`]). Every checkpoint-producing handler first checks that
//! the checkpoints branch exists and silently does nothing otherwise, so
//! hooks installed before `entire enable` finished are harmless.

use std::path::Path;

use crate::capture::{prompt_excerpt, render_context, Agent, AgentRegistry};
use crate::checkpoint::SessionBundle;
use crate::error::{Error, Result};
use crate::storage::models::{SessionData, SessionMetadata};

mod auto;
mod manual;

pub use auto::AutoCommit;
pub use manual::ManualCommit;

/// Name of the commit-only strategy.
pub const MANUAL_COMMIT: &str = "manual-commit";

/// Name of the strategy that also checkpoints agent responses.
pub const AUTO_COMMIT: &str = "auto-commit";

/// Message stored on checkpoints created from agent responses.
pub const AUTO_CHECKPOINT_MESSAGE: &str = "[entire] auto checkpoint";

/// An agent finished responding.
#[derive(Debug, Clone, Default)]
pub struct AgentResponseEvent {
    pub agent_name: String,
    pub session_id: String,
}

/// A commit was made. Empty fields are resolved from `HEAD`.
#[derive(Debug, Clone, Default)]
pub struct CommitEvent {
    pub commit_hash: String,
    pub branch: String,
    pub message: String,
}

/// A push is about to happen.
#[derive(Debug, Clone, Default)]
pub struct PushEvent {
    pub remote: String,
    pub branch: String,
}

/// Policy reacting to repository and agent events.
///
/// Handlers that may produce a checkpoint return its id, or `None` when
/// nothing was written.
pub trait Strategy {
    fn name(&self) -> &'static str;

    fn on_agent_response(&self, event: &AgentResponseEvent) -> Result<Option<String>>;

    fn on_commit(&self, event: &CommitEvent) -> Result<Option<String>>;

    fn on_push(&self, event: &PushEvent) -> Result<()>;
}

/// Resolves a configured strategy name (or its short alias) to the
/// canonical name.
pub fn canonical_name(name: &str) -> Result<&'static str> {
    match name.trim() {
        MANUAL_COMMIT | "manual" => Ok(MANUAL_COMMIT),
        AUTO_COMMIT | "auto" => Ok(AUTO_COMMIT),
        other => Err(Error::UnknownStrategy(other.to_string())),
    }
}

/// Builds the strategy called `name` for the repository at `repo_dir`.
///
/// # Errors
///
/// [`Error::UnknownStrategy`] for names other than `manual-commit`,
/// `auto-commit` and their aliases.
pub fn new_strategy<'a>(
    name: &str,
    repo_dir: &Path,
    registry: &'a AgentRegistry,
) -> Result<Box<dyn Strategy + 'a>> {
    match canonical_name(name)? {
        MANUAL_COMMIT => Ok(Box::new(ManualCommit::new(repo_dir, registry))),
        _ => Ok(Box::new(AutoCommit::new(repo_dir, registry))),
    }
}

/// A session bundle plus the files the session touched.
pub(crate) struct CapturedSession {
    pub bundle: SessionBundle,
    pub files_changed: Vec<String>,
}

/// Reads and parses an agent session into a bundle.
///
/// Any failure degrades to a metadata-only bundle that keeps the agent
/// name and session id.
pub(crate) fn capture_session(agent: &dyn Agent, session_id: &str, repo_dir: &Path) -> CapturedSession {
    let name = agent.info().name;
    let fallback = || CapturedSession {
        bundle: SessionBundle::metadata_only(SessionMetadata {
            agent_name: name.to_string(),
            session_id: session_id.to_string(),
            ..Default::default()
        }),
        files_changed: Vec::new(),
    };

    let transcript_path = agent.transcript_path(session_id, repo_dir);
    let transcript = match std::fs::read(&transcript_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                "Could not read {} transcript {}: {}",
                name,
                transcript_path.display(),
                e
            );
            return fallback();
        }
    };

    let session = match agent.parse_session(session_id, repo_dir) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Could not parse {} session {}: {}", name, session_id, e);
            return fallback();
        }
    };

    CapturedSession {
        bundle: bundle_from_session(&session, transcript),
        files_changed: collect_files(&session),
    }
}

fn bundle_from_session(session: &SessionData, transcript: Vec<u8>) -> SessionBundle {
    SessionBundle {
        metadata: SessionMetadata {
            agent_name: session.agent_name.clone(),
            session_id: session.id.clone(),
            token_usage: session.total_usage(),
            attribution: None,
            started_at: session.started_at,
            ended_at: session.ended_at,
        },
        full_transcript: transcript,
        context: render_context(session),
        prompts: prompt_excerpt(session),
    }
}

/// Files changed by a session and its sub-agents, first-seen order.
fn collect_files(session: &SessionData) -> Vec<String> {
    let mut files = session.files_changed.clone();
    for nested in &session.nested_sessions {
        for file in collect_files(nested) {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }
    files
}
