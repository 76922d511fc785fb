//! Checkpoint after every agent response, and on every commit.

use std::path::{Path, PathBuf};

use super::{
    capture_session, AgentResponseEvent, CommitEvent, ManualCommit, PushEvent, Strategy,
    AUTO_CHECKPOINT_MESSAGE, AUTO_COMMIT,
};
use crate::capture::AgentRegistry;
use crate::checkpoint::{generate_id, CheckpointStore, SessionBundle};
use crate::error::Result;
use crate::git::Repository;
use crate::storage::models::{CheckpointMetadata, SessionMetadata};

/// Creates a checkpoint as soon as an agent responds. Commits are handled
/// exactly like [`ManualCommit`].
pub struct AutoCommit<'a> {
    repo_dir: PathBuf,
    registry: &'a AgentRegistry,
    manual: ManualCommit<'a>,
}

impl<'a> AutoCommit<'a> {
    pub fn new(repo_dir: &Path, registry: &'a AgentRegistry) -> Self {
        Self {
            repo_dir: repo_dir.to_path_buf(),
            registry,
            manual: ManualCommit::new(repo_dir, registry),
        }
    }
}

impl Strategy for AutoCommit<'_> {
    fn name(&self) -> &'static str {
        AUTO_COMMIT
    }

    fn on_agent_response(&self, event: &AgentResponseEvent) -> Result<Option<String>> {
        let repo = Repository::open(&self.repo_dir)?;
        if !repo.has_checkpoints_branch() {
            tracing::debug!("Checkpoints branch does not exist, skipping");
            return Ok(None);
        }

        let id = generate_id()?;
        // Agent responses may arrive before the first commit.
        let commit_hash = repo.head_commit_hash().unwrap_or_default();
        let branch = repo.current_branch().unwrap_or_default();
        let mut meta = CheckpointMetadata::new(
            &id,
            commit_hash,
            branch,
            repo.author(),
            AUTO_CHECKPOINT_MESSAGE,
            AUTO_COMMIT,
        );

        let bundle = match self.registry.get(&event.agent_name) {
            Ok(agent) => capture_session(agent, &event.session_id, &repo.workdir()).bundle,
            Err(e) => {
                tracing::warn!("{}; storing session metadata only", e);
                SessionBundle::metadata_only(SessionMetadata {
                    agent_name: event.agent_name.clone(),
                    session_id: event.session_id.clone(),
                    ..Default::default()
                })
            }
        };

        CheckpointStore::for_repo(&repo).create(&mut meta, &[bundle])?;
        Ok(Some(id))
    }

    fn on_commit(&self, event: &CommitEvent) -> Result<Option<String>> {
        self.manual.checkpoint_commit(event, AUTO_COMMIT)
    }

    fn on_push(&self, event: &PushEvent) -> Result<()> {
        tracing::debug!("{}: push to {} ({})", AUTO_COMMIT, event.remote, event.branch);
        Ok(())
    }
}
