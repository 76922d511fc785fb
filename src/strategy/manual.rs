//! Checkpoint on every commit.

use std::path::{Path, PathBuf};

use super::{
    capture_session, AgentResponseEvent, CapturedSession, CommitEvent, PushEvent, Strategy,
    MANUAL_COMMIT,
};
use crate::attribution::Tracker;
use crate::capture::AgentRegistry;
use crate::checkpoint::{generate_id, CheckpointStore, SessionBundle};
use crate::error::Result;
use crate::git::{format_attribution_trailer, Repository, TRAILER_ATTRIBUTION, TRAILER_CHECKPOINT};
use crate::storage::models::{CheckpointMetadata, SessionMetadata};

/// Creates a checkpoint when the user commits and tags the commit with an
/// `Entire-Checkpoint` trailer.
pub struct ManualCommit<'a> {
    repo_dir: PathBuf,
    registry: &'a AgentRegistry,
}

impl<'a> ManualCommit<'a> {
    pub fn new(repo_dir: &Path, registry: &'a AgentRegistry) -> Self {
        Self {
            repo_dir: repo_dir.to_path_buf(),
            registry,
        }
    }

    /// Commit handling shared with [`super::AutoCommit`]; `strategy` is the
    /// name recorded on the checkpoint.
    pub(crate) fn checkpoint_commit(
        &self,
        event: &CommitEvent,
        strategy: &str,
    ) -> Result<Option<String>> {
        let repo = Repository::open(&self.repo_dir)?;
        if !repo.has_checkpoints_branch() {
            tracing::debug!("Checkpoints branch does not exist, skipping");
            return Ok(None);
        }

        let id = generate_id()?;
        let commit_hash = or_resolve(&event.commit_hash, || repo.head_commit_hash());
        let branch = or_resolve(&event.branch, || repo.current_branch());
        let message = or_resolve(&event.message, || repo.last_commit_message());
        let mut meta =
            CheckpointMetadata::new(&id, &commit_hash, branch, repo.author(), message, strategy);

        let workdir = repo.workdir();
        let CapturedSession {
            mut bundle,
            files_changed,
        } = match self.registry.detect_any(&workdir) {
            Some((agent, session_id)) => capture_session(agent, &session_id, &workdir),
            None => CapturedSession {
                bundle: SessionBundle::metadata_only(SessionMetadata::unknown()),
                files_changed: Vec::new(),
            },
        };

        if !files_changed.is_empty() && !commit_hash.is_empty() {
            let attribution = Tracker::new(&repo).for_commit(&commit_hash, &files_changed);
            if attribution.total_lines > 0 {
                meta.attribution = Some(attribution);
                bundle.metadata.attribution = Some(attribution);
            }
        }

        CheckpointStore::for_repo(&repo).create(&mut meta, &[bundle])?;

        // The checkpoint is already stored; a failed amend only loses the link.
        if let Err(e) = repo.append_trailer(TRAILER_CHECKPOINT, &id) {
            tracing::warn!("Failed to add checkpoint trailer to {}: {}", commit_hash, e);
        }
        if let Some(a) = meta.attribution {
            let value = format_attribution_trailer(a.agent_percent, a.agent_lines, a.total_lines);
            if let Err(e) = repo.append_trailer(TRAILER_ATTRIBUTION, &value) {
                tracing::warn!("Failed to add attribution trailer: {}", e);
            }
        }

        Ok(Some(id))
    }
}

impl Strategy for ManualCommit<'_> {
    fn name(&self) -> &'static str {
        MANUAL_COMMIT
    }

    fn on_agent_response(&self, event: &AgentResponseEvent) -> Result<Option<String>> {
        tracing::debug!("{}: ignoring agent response for {}", MANUAL_COMMIT, event.session_id);
        Ok(None)
    }

    fn on_commit(&self, event: &CommitEvent) -> Result<Option<String>> {
        self.checkpoint_commit(event, MANUAL_COMMIT)
    }

    fn on_push(&self, event: &PushEvent) -> Result<()> {
        tracing::debug!("{}: push to {} ({})", MANUAL_COMMIT, event.remote, event.branch);
        Ok(())
    }
}

/// `value` if set, otherwise the resolved value (empty when resolution fails).
fn or_resolve(value: &str, resolve: impl FnOnce() -> Result<String>) -> String {
    if !value.is_empty() {
        return value.to_string();
    }
    resolve().unwrap_or_else(|e| {
        tracing::debug!("Could not resolve commit context: {}", e);
        String::new()
    })
}
