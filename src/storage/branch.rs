//! Content store backed by a git branch.

use super::{ContentStore, FileBatch};
use crate::error::Result;
use crate::git::{Repository, CHECKPOINTS_BRANCH};

/// Stores files as commits on one branch of a repository.
pub struct BranchStore<'r> {
    repo: &'r Repository,
    branch: String,
}

impl<'r> BranchStore<'r> {
    pub fn new(repo: &'r Repository, branch: impl Into<String>) -> Self {
        Self {
            repo,
            branch: branch.into(),
        }
    }

    /// Store on the fixed checkpoints branch.
    pub fn checkpoints(repo: &'r Repository) -> Self {
        Self::new(repo, CHECKPOINTS_BRANCH)
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn repo(&self) -> &'r Repository {
        self.repo
    }
}

impl ContentStore for BranchStore<'_> {
    fn put(&self, message: &str, batch: &FileBatch) -> Result<()> {
        self.repo
            .commit_files_on_branch(&self.branch, message, batch)
            .map(|_| ())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.repo.read_file_at_branch(&self.branch, path)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.repo.list_files_at_branch(&self.branch, prefix)
    }

    fn is_ready(&self) -> bool {
        self.repo.has_branch(&self.branch)
    }
}
