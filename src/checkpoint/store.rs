//! Checkpoint persistence on top of a [`ContentStore`].
//!
//! The store owns the sharded layout: callers hand in metadata and session
//! bundles, and every file belonging to one checkpoint is written in a
//! single `put`, so a checkpoint is either fully visible or absent.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;

use super::{id_from_metadata_path, metadata_path, session_files};
use crate::error::{Error, Result};
use crate::git::Repository;
use crate::storage::{
    BranchStore, CheckpointMetadata, ContentStore, FileBatch, SessionMetadata, SessionSummary,
};

/// Everything stored for one session of a checkpoint.
#[derive(Debug, Clone, Default)]
pub struct SessionBundle {
    pub metadata: SessionMetadata,
    /// Raw transcript bytes (`full.jsonl`)
    pub full_transcript: Vec<u8>,
    /// Rendered markdown (`context.md`); not written when empty
    pub context: String,
    /// Prompt excerpt (`prompt.txt`); not written when empty
    pub prompts: String,
}

impl SessionBundle {
    /// A bundle with metadata only, for sessions whose transcript is unknown.
    pub fn metadata_only(metadata: SessionMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }
}

/// Reads and writes checkpoints through a content store.
pub struct CheckpointStore<S> {
    store: S,
}

impl<'r> CheckpointStore<BranchStore<'r>> {
    /// Store backed by the repository's checkpoints branch.
    pub fn for_repo(repo: &'r Repository) -> Self {
        Self::new(BranchStore::checkpoints(repo))
    }
}

impl<S: ContentStore> CheckpointStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &S {
        &self.store
    }

    /// Writes a new checkpoint and all of its sessions in one batch.
    ///
    /// `metadata.created_at` is overwritten with the current time. When the
    /// caller left `metadata.sessions` empty it is filled from the bundles.
    pub fn create(&self, metadata: &mut CheckpointMetadata, sessions: &[SessionBundle]) -> Result<()> {
        metadata.created_at = Utc::now();
        if metadata.sessions.is_empty() {
            metadata.sessions = sessions
                .iter()
                .enumerate()
                .map(|(index, bundle)| SessionSummary {
                    index,
                    agent_name: bundle.metadata.agent_name.clone(),
                    session_id: bundle.metadata.session_id.clone(),
                    token_usage: bundle.metadata.token_usage,
                })
                .collect();
        }

        let id = metadata.id.clone();
        let mut batch = FileBatch::new();
        batch.insert(metadata_path(&id), serde_json::to_vec_pretty(metadata)?);

        for (index, bundle) in sessions.iter().enumerate() {
            let files = session_files(&id, index);
            batch.insert(files.metadata, serde_json::to_vec_pretty(&bundle.metadata)?);
            batch.insert(files.full, bundle.full_transcript.clone());
            if !bundle.context.is_empty() {
                batch.insert(files.context, bundle.context.clone().into_bytes());
            }
            if !bundle.prompts.is_empty() {
                batch.insert(files.prompt, bundle.prompts.clone().into_bytes());
            }
            batch.insert(
                files.content_hash,
                content_hash(&bundle.full_transcript).into_bytes(),
            );
        }

        self.store.put(&format!("checkpoint {id}"), &batch)?;
        tracing::info!(
            "Created checkpoint {} ({} sessions, strategy {})",
            id,
            sessions.len(),
            metadata.strategy
        );
        Ok(())
    }

    /// Reads a checkpoint's metadata.
    ///
    /// # Errors
    ///
    /// [`Error::CheckpointNotFound`] if nothing is stored under `id`,
    /// [`Error::ParseError`] if the stored metadata is malformed.
    pub fn get(&self, id: &str) -> Result<CheckpointMetadata> {
        let path = metadata_path(id);
        let data = self.store.get(&path).map_err(|e| {
            if e.is_not_found() {
                Error::CheckpointNotFound(id.to_string())
            } else {
                e
            }
        })?;
        serde_json::from_slice(&data).map_err(|e| Error::parse(path, e))
    }

    /// All readable checkpoints, most recent first. Entries that fail to
    /// load are logged and skipped.
    pub fn list(&self) -> Result<Vec<CheckpointMetadata>> {
        if !self.store.is_ready() {
            return Ok(Vec::new());
        }

        let ids: BTreeSet<String> = self
            .store
            .list("")?
            .iter()
            .filter_map(|path| id_from_metadata_path(path))
            .collect();

        let mut checkpoints = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(&id) {
                Ok(meta) => checkpoints.push(meta),
                Err(e) => tracing::debug!("Skipping checkpoint {}: {}", id, e),
            }
        }

        checkpoints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(checkpoints)
    }

    /// Number of stored checkpoints.
    pub fn count(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    /// Metadata of one session.
    pub fn session_metadata(&self, id: &str, index: usize) -> Result<SessionMetadata> {
        let path = session_files(id, index).metadata;
        let data = self.read_session_file(id, &path)?;
        serde_json::from_slice(&data).map_err(|e| Error::parse(path, e))
    }

    /// The session's raw transcript (`full.jsonl`).
    pub fn raw_transcript(&self, id: &str, index: usize) -> Result<Vec<u8>> {
        self.read_session_file(id, &session_files(id, index).full)
    }

    /// The rendered transcript (`context.md`), falling back to the raw
    /// transcript when no rendering was stored.
    pub fn formatted_transcript(&self, id: &str, index: usize) -> Result<Vec<u8>> {
        match self.store.get(&session_files(id, index).context) {
            Ok(data) => Ok(data),
            Err(e) if e.is_not_found() => self.raw_transcript(id, index),
            Err(e) => Err(e),
        }
    }

    /// Checks out the commit a checkpoint was captured at.
    ///
    /// With `hard`, local modifications are discarded.
    ///
    /// # Errors
    ///
    /// [`Error::NoAssociatedCommit`] if the checkpoint was captured before
    /// any commit; nothing is checked out in that case.
    pub fn rewind(&self, repo_dir: &Path, id: &str, hard: bool) -> Result<()> {
        let meta = self.get(id)?;
        if meta.commit_hash.is_empty() {
            return Err(Error::NoAssociatedCommit(id.to_string()));
        }

        let repo = Repository::open(repo_dir)?;
        repo.checkout(&meta.commit_hash, hard)?;
        tracing::info!("Rewound to checkpoint {} at {}", id, meta.commit_hash);
        Ok(())
    }

    fn read_session_file(&self, id: &str, path: &str) -> Result<Vec<u8>> {
        self.store.get(path).map_err(|e| {
            if e.is_not_found() {
                Error::CheckpointNotFound(format!("{id} ({path})"))
            } else {
                e
            }
        })
    }
}

/// Lowercase-hex SHA-256 of a transcript.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
