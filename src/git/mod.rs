//! Git integration.
//!
//! Wraps a libgit2 repository handle with the branch-scoped primitives the
//! checkpoint store is built on, plus the trailer and diff helpers used to
//! tie checkpoints back into ordinary commit history.
//!
//! Writes to the checkpoints branch never check the branch out: blobs, a
//! tree and a commit are written straight to the object database and the
//! branch reference is moved in one step. The caller's `HEAD`, index and
//! working tree are left exactly as they were, whether the write succeeds
//! or not.

use git2::{
    build::CheckoutBuilder, BranchType, ErrorCode, IndexEntry, IndexTime, ObjectType, Oid,
    TreeWalkMode, TreeWalkResult,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::is_valid_store_path;

mod diff;
pub mod trailers;

pub use trailers::{
    append_trailer_to_message, format_attribution_trailer, has_trailer, parse_checkpoint_trailer,
    read_trailer, TRAILER_ATTRIBUTION, TRAILER_CHECKPOINT,
};

/// Orphan branch holding all checkpoints.
pub const CHECKPOINTS_BRANCH: &str = "entire/checkpoints/v1";

/// Prefix shared by every branch Entire creates.
pub const SHADOW_BRANCH_PREFIX: &str = "entire/";

/// How many times a checkpoint commit is retried when another writer moved
/// the branch tip between reading it and updating it.
const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Number of recent commits scanned by [`Repository::find_checkpoint_trailer`].
const TRAILER_SCAN_DEPTH: usize = 10;

/// A git repository opened for checkpoint storage.
pub struct Repository {
    inner: git2::Repository,
}

impl Repository {
    /// Opens the repository containing `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotARepository`] if no repository metadata is found
    /// at or above `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        let inner = git2::Repository::discover(dir).map_err(|e| {
            tracing::debug!("Repository discovery failed for {}: {}", dir.display(), e);
            Error::NotARepository(dir.to_path_buf())
        })?;
        Ok(Self { inner })
    }

    /// Root of the working tree (the `.git` parent for bare repositories).
    pub fn workdir(&self) -> PathBuf {
        self.inner
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.inner.path().to_path_buf())
    }

    /// The `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// The underlying libgit2 handle.
    pub fn raw(&self) -> &git2::Repository {
        &self.inner
    }

    // ==================== Branches ====================

    /// Returns the checked-out branch name, or `HEAD` when detached.
    ///
    /// An unborn branch (fresh repository, no commits yet) still reports the
    /// branch `HEAD` points at.
    pub fn current_branch(&self) -> Result<String> {
        match self.inner.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().unwrap_or("HEAD").to_string()),
            Ok(_) => Ok("HEAD".to_string()),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.inner.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .unwrap_or("HEAD")
                    .to_string())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks out a branch name or any revision (detached).
    ///
    /// With `force`, local modifications are overwritten; otherwise the
    /// checkout refuses to clobber them.
    pub fn checkout(&self, rev: &str, force: bool) -> Result<()> {
        let mut opts = CheckoutBuilder::new();
        if force {
            opts.force();
        } else {
            opts.safe();
        }

        if let Ok(branch) = self.inner.find_branch(rev, BranchType::Local) {
            let reference = branch.into_reference();
            let refname = reference
                .name()
                .map(str::to_string)
                .ok_or_else(|| Error::BranchNotFound(rev.to_string()))?;
            let commit = reference.peel_to_commit()?;
            self.inner.checkout_tree(commit.as_object(), Some(&mut opts))?;
            self.inner.set_head(&refname)?;
        } else {
            let object = self
                .inner
                .revparse_single(rev)
                .map_err(|_| Error::BranchNotFound(rev.to_string()))?;
            let commit = object.peel_to_commit()?;
            self.inner.checkout_tree(commit.as_object(), Some(&mut opts))?;
            self.inner.set_head_detached(commit.id())?;
        }

        tracing::debug!("Checked out {} (force: {})", rev, force);
        Ok(())
    }

    /// Returns true if a local branch with this name exists.
    pub fn has_branch(&self, name: &str) -> bool {
        self.inner.find_branch(name, BranchType::Local).is_ok()
    }

    /// Returns true once `enable` has created the checkpoints branch.
    pub fn has_checkpoints_branch(&self) -> bool {
        self.has_branch(CHECKPOINTS_BRANCH)
    }

    /// Deletes a local branch.
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        let mut branch = self
            .inner
            .find_branch(name, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(name.to_string()))?;
        branch.delete()?;
        tracing::debug!("Deleted branch {}", name);
        Ok(())
    }

    /// Lists local branches whose names start with `prefix`, sorted.
    pub fn list_branches_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in self.inner.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                if name.starts_with(prefix) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Entire-owned branches other than the checkpoints branch.
    pub fn shadow_branches(&self) -> Result<Vec<String>> {
        Ok(self
            .list_branches_with_prefix(SHADOW_BRANCH_PREFIX)?
            .into_iter()
            .filter(|b| b != CHECKPOINTS_BRANCH)
            .collect())
    }

    /// Creates the orphan checkpoints branch if it does not exist yet.
    ///
    /// Returns true if the branch was created by this call.
    pub fn ensure_checkpoints_branch(&self) -> Result<bool> {
        if self.has_checkpoints_branch() {
            return Ok(false);
        }

        let tree_id = self.inner.treebuilder(None)?.write()?;
        let tree = self.inner.find_tree(tree_id)?;
        let sig = self.signature()?;
        self.inner
            .commit(
                Some(&branch_ref(CHECKPOINTS_BRANCH)),
                &sig,
                &sig,
                "Initialize entire checkpoints",
                &tree,
                &[],
            )
            .map_err(|source| Error::CommitFailed {
                context: format!("creating {CHECKPOINTS_BRANCH}"),
                source,
            })?;

        tracing::info!("Created checkpoints branch {}", CHECKPOINTS_BRANCH);
        Ok(true)
    }

    /// Number of commits on the checkpoints branch, including the root.
    pub fn checkpoints_branch_depth(&self) -> Result<usize> {
        let tip = self.branch_commit(CHECKPOINTS_BRANCH)?;
        let mut walk = self.inner.revwalk()?;
        walk.push(tip.id())?;
        Ok(walk.count())
    }

    // ==================== Branch-scoped files ====================

    /// Reads a file from the tip of `branch` without touching the checkout.
    ///
    /// # Errors
    ///
    /// [`Error::BranchNotFound`] if the branch is missing,
    /// [`Error::FileNotFound`] if the path is missing or is a directory.
    pub fn read_file_at_branch(&self, branch: &str, path: &str) -> Result<Vec<u8>> {
        let not_found = || Error::FileNotFound {
            branch: branch.to_string(),
            path: path.to_string(),
        };

        let tree = self.branch_commit(branch)?.tree()?;
        let entry = tree.get_path(Path::new(path)).map_err(|_| not_found())?;
        let object = entry.to_object(&self.inner)?;
        let blob = object.peel_to_blob().map_err(|_| not_found())?;
        Ok(blob.content().to_vec())
    }

    /// Lists file paths on `branch` that start with `prefix`, sorted.
    pub fn list_files_at_branch(&self, branch: &str, prefix: &str) -> Result<Vec<String>> {
        let tree = self.branch_commit(branch)?.tree()?;
        let mut files = Vec::new();

        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    let path = format!("{root}{name}");
                    if path.starts_with(prefix) {
                        files.push(path);
                    }
                }
            }
            TreeWalkResult::Ok
        })?;

        files.sort();
        Ok(files)
    }

    /// Writes every entry of `files` to `branch` as a single commit.
    ///
    /// The new tree is the branch tip's tree with `files` laid over it. The
    /// commit and the reference update happen in one libgit2 call that
    /// fails if the tip moved since it was read; that case is retried.
    /// Nothing outside the object database and the branch ref is modified.
    ///
    /// # Errors
    ///
    /// [`Error::BranchNotFound`] if the branch does not exist,
    /// [`Error::CommitFailed`] if a blob, tree or commit cannot be written.
    pub fn commit_files_on_branch(
        &self,
        branch: &str,
        message: &str,
        files: &BTreeMap<String, Vec<u8>>,
    ) -> Result<Oid> {
        let refname = branch_ref(branch);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let parent = self.branch_commit(branch)?;
            let tree_id = self
                .build_tree(&parent, files)
                .map_err(|source| Error::CommitFailed {
                    context: format!("writing files for {branch}"),
                    source,
                })?;
            let tree = self.inner.find_tree(tree_id)?;
            let sig = self.signature()?;

            match self
                .inner
                .commit(Some(&refname), &sig, &sig, message, &tree, &[&parent])
            {
                Ok(oid) => {
                    tracing::debug!("Committed {} files to {} as {}", files.len(), branch, oid);
                    return Ok(oid);
                }
                Err(e) if e.code() == ErrorCode::Modified && attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::warn!(
                        "Branch {} moved during write (attempt {}), retrying",
                        branch,
                        attempt
                    );
                }
                Err(source) => {
                    return Err(Error::CommitFailed {
                        context: format!("committing to {branch}"),
                        source,
                    })
                }
            }
        }
    }

    fn build_tree(
        &self,
        base: &git2::Commit<'_>,
        files: &BTreeMap<String, Vec<u8>>,
    ) -> std::result::Result<Oid, git2::Error> {
        let mut index = git2::Index::new()?;
        index.read_tree(&base.tree()?)?;

        for (path, data) in files {
            validate_store_path(path)?;
            let blob = self.inner.blob(data)?;
            index.add(&blob_entry(path, blob, data.len()))?;
        }

        index.write_tree_to(&self.inner)
    }

    fn branch_commit(&self, branch: &str) -> Result<git2::Commit<'_>> {
        let found = self
            .inner
            .find_branch(branch, BranchType::Local)
            .map_err(|e| match e.code() {
                ErrorCode::NotFound | ErrorCode::InvalidSpec => {
                    Error::BranchNotFound(branch.to_string())
                }
                _ => Error::Git(e),
            })?;
        Ok(found.get().peel_to_commit()?)
    }

    // ==================== Commits ====================

    /// Full SHA of `HEAD`.
    pub fn head_commit_hash(&self) -> Result<String> {
        Ok(self.head_commit()?.id().to_string())
    }

    /// Message of the `HEAD` commit, trimmed.
    pub fn last_commit_message(&self) -> Result<String> {
        Ok(self
            .head_commit()?
            .message()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    /// Message of any revision, untrimmed.
    pub fn commit_message(&self, rev: &str) -> Result<String> {
        let commit = self.inner.revparse_single(rev)?.peel_to_commit()?;
        Ok(commit.message().unwrap_or_default().to_string())
    }

    /// Full hash of the commit `rev` resolves to.
    pub fn commit_hash(&self, rev: &str) -> Result<String> {
        Ok(self.inner.revparse_single(rev)?.peel_to_commit()?.id().to_string())
    }

    /// Configured `user.name`, empty when unset.
    pub fn author(&self) -> String {
        self.inner
            .config()
            .and_then(|c| c.get_string("user.name"))
            .unwrap_or_default()
    }

    fn head_commit(&self) -> Result<git2::Commit<'_>> {
        Ok(self.inner.head()?.peel_to_commit()?)
    }

    fn signature(&self) -> Result<git2::Signature<'static>> {
        self.inner
            .signature()
            .or_else(|_| git2::Signature::now("Entire", "entire@localhost"))
            .map_err(Error::from)
    }

    // ==================== Trailers ====================

    /// Appends `key: value` to the `HEAD` commit message by amending it.
    ///
    /// No-op if the message already carries a `key:` trailer. Returns true
    /// if the commit was amended.
    pub fn append_trailer(&self, key: &str, value: &str) -> Result<bool> {
        let head = self.head_commit()?;
        let message = head.message().unwrap_or_default();

        if has_trailer(message, key) {
            tracing::debug!("Commit {} already has a {} trailer", head.id(), key);
            return Ok(false);
        }

        let amended = append_trailer_to_message(message, key, value);
        let oid = head
            .amend(Some("HEAD"), None, None, None, Some(&amended), None)
            .map_err(|source| Error::CommitFailed {
                context: format!("amending HEAD with {key} trailer"),
                source,
            })?;

        tracing::debug!("Amended {} -> {} with {} trailer", head.id(), oid, key);
        Ok(true)
    }

    /// Checkpoint id recorded in the trailer of one commit.
    pub fn checkpoint_from_commit(&self, rev: &str) -> Result<String> {
        let message = self.commit_message(rev)?;
        parse_checkpoint_trailer(&message).ok_or_else(|| Error::NoCheckpointTrailer(rev.to_string()))
    }

    /// Most recent checkpoint id found in the last few commits of `branch`.
    pub fn find_checkpoint_trailer(&self, branch: &str) -> Result<String> {
        let tip = self.branch_commit(branch)?;
        let mut walk = self.inner.revwalk()?;
        walk.push(tip.id())?;

        for oid in walk.take(TRAILER_SCAN_DEPTH) {
            let commit = self.inner.find_commit(oid?)?;
            if let Some(id) = parse_checkpoint_trailer(commit.message().unwrap_or_default()) {
                return Ok(id);
            }
        }

        Err(Error::NoCheckpointTrailer(branch.to_string()))
    }
}

fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{branch}")
}

fn blob_entry(path: &str, id: Oid, size: usize) -> IndexEntry {
    IndexEntry {
        ctime: IndexTime::new(0, 0),
        mtime: IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode: 0o100644,
        uid: 0,
        gid: 0,
        file_size: u32::try_from(size).unwrap_or(u32::MAX),
        id,
        flags: 0,
        flags_extended: 0,
        path: path.as_bytes().to_vec(),
    }
}

/// Rejects paths that would escape the tree or that git refuses to store.
fn validate_store_path(path: &str) -> std::result::Result<(), git2::Error> {
    if is_valid_store_path(path) {
        Ok(())
    } else {
        Err(git2::Error::from_str(&format!("invalid store path: {path:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Initializes a repository with one commit on `main`.
    fn init_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let raw = git2::Repository::init(dir.path()).expect("Failed to init repo");
        raw.set_head("refs/heads/main").expect("Failed to set HEAD");

        std::fs::write(dir.path().join("README.md"), "hello\n").expect("Failed to write file");
        let mut index = raw.index().expect("Failed to get index");
        index.add_path(Path::new("README.md")).expect("Failed to add");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = raw.find_tree(tree_id).expect("Failed to find tree");
        let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
        raw.commit(Some("HEAD"), &sig, &sig, "initial commit", &tree, &[])
            .expect("Failed to commit");

        let repo = Repository::open(dir.path()).expect("Failed to open repo");
        (dir, repo)
    }

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_open_not_a_repository() {
        let dir = TempDir::new().unwrap();
        let result = Repository::open(dir.path());
        assert!(matches!(result, Err(Error::NotARepository(_))));
    }

    #[test]
    fn test_current_branch() {
        let (_dir, repo) = init_repo();
        assert_eq!(repo.current_branch().unwrap(), "main");
    }

    #[test]
    fn test_current_branch_unborn() {
        let dir = TempDir::new().unwrap();
        let raw = git2::Repository::init(dir.path()).unwrap();
        raw.set_head("refs/heads/trunk").unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.current_branch().unwrap(), "trunk");
    }

    #[test]
    fn test_ensure_checkpoints_branch_is_idempotent() {
        let (_dir, repo) = init_repo();
        assert!(!repo.has_checkpoints_branch());
        assert!(repo.ensure_checkpoints_branch().unwrap());
        assert!(!repo.ensure_checkpoints_branch().unwrap());
        assert!(repo.has_checkpoints_branch());
        assert_eq!(repo.current_branch().unwrap(), "main");
        assert!(repo
            .list_files_at_branch(CHECKPOINTS_BRANCH, "")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_commit_files_on_branch_keeps_working_branch() {
        let (dir, repo) = init_repo();
        repo.ensure_checkpoints_branch().unwrap();

        repo.commit_files_on_branch(
            CHECKPOINTS_BRANCH,
            "checkpoint a3b2c4d5e6f7",
            &files(&[
                ("a3/b2c4d5e6f7/metadata.json", "{}"),
                ("a3/b2c4d5e6f7/0/full.jsonl", "line\n"),
            ]),
        )
        .unwrap();

        assert_eq!(repo.current_branch().unwrap(), "main");
        assert!(!dir.path().join("a3").exists());
        assert_eq!(
            repo.read_file_at_branch(CHECKPOINTS_BRANCH, "a3/b2c4d5e6f7/0/full.jsonl")
                .unwrap(),
            b"line\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "hello\n"
        );
    }

    #[test]
    fn test_commit_files_on_branch_preserves_existing_files() {
        let (_dir, repo) = init_repo();
        repo.ensure_checkpoints_branch().unwrap();

        repo.commit_files_on_branch(CHECKPOINTS_BRANCH, "one", &files(&[("aa/one.txt", "1")]))
            .unwrap();
        repo.commit_files_on_branch(CHECKPOINTS_BRANCH, "two", &files(&[("bb/two.txt", "2")]))
            .unwrap();

        let listed = repo.list_files_at_branch(CHECKPOINTS_BRANCH, "").unwrap();
        assert_eq!(listed, vec!["aa/one.txt", "bb/two.txt"]);
        assert_eq!(
            repo.list_files_at_branch(CHECKPOINTS_BRANCH, "bb/").unwrap(),
            vec!["bb/two.txt"]
        );
        assert_eq!(repo.checkpoints_branch_depth().unwrap(), 3);
    }

    #[test]
    fn test_commit_files_on_missing_branch_fails_without_side_effects() {
        let (_dir, repo) = init_repo();
        let head_before = repo.head_commit_hash().unwrap();

        let result = repo.commit_files_on_branch("entire/missing", "msg", &files(&[("a/b", "x")]));
        assert!(matches!(result, Err(Error::BranchNotFound(_))));
        assert_eq!(repo.current_branch().unwrap(), "main");
        assert_eq!(repo.head_commit_hash().unwrap(), head_before);
    }

    #[test]
    fn test_commit_files_invalid_path_fails_without_side_effects() {
        let (_dir, repo) = init_repo();
        repo.ensure_checkpoints_branch().unwrap();
        let depth_before = repo.checkpoints_branch_depth().unwrap();

        let result = repo.commit_files_on_branch(
            CHECKPOINTS_BRANCH,
            "msg",
            &files(&[("ok/file.txt", "fine"), ("../escape.txt", "bad")]),
        );

        assert!(matches!(result, Err(Error::CommitFailed { .. })));
        assert_eq!(repo.current_branch().unwrap(), "main");
        assert_eq!(repo.checkpoints_branch_depth().unwrap(), depth_before);
        assert!(repo
            .list_files_at_branch(CHECKPOINTS_BRANCH, "")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_commit_files_locked_ref_fails_without_side_effects() {
        let (_dir, repo) = init_repo();
        repo.ensure_checkpoints_branch().unwrap();
        let depth_before = repo.checkpoints_branch_depth().unwrap();
        let head_before = repo.head_commit_hash().unwrap();

        let lock = repo
            .git_dir()
            .join("refs/heads")
            .join(format!("{CHECKPOINTS_BRANCH}.lock"));
        std::fs::write(&lock, "").unwrap();

        let result =
            repo.commit_files_on_branch(CHECKPOINTS_BRANCH, "msg", &files(&[("aa/x.txt", "x")]));

        assert!(matches!(result, Err(Error::CommitFailed { .. })));
        assert_eq!(repo.current_branch().unwrap(), "main");
        assert_eq!(repo.head_commit_hash().unwrap(), head_before);
        assert_eq!(repo.checkpoints_branch_depth().unwrap(), depth_before);

        std::fs::remove_file(&lock).unwrap();
        repo.commit_files_on_branch(CHECKPOINTS_BRANCH, "msg", &files(&[("aa/x.txt", "x")]))
            .unwrap();
        assert_eq!(repo.checkpoints_branch_depth().unwrap(), depth_before + 1);
    }

    #[test]
    fn test_read_file_at_branch_not_found() {
        let (_dir, repo) = init_repo();
        repo.ensure_checkpoints_branch().unwrap();

        let missing_path = repo.read_file_at_branch(CHECKPOINTS_BRANCH, "no/such/file");
        assert!(matches!(missing_path, Err(Error::FileNotFound { .. })));

        let missing_branch = repo.read_file_at_branch("nope", "README.md");
        assert!(matches!(missing_branch, Err(Error::BranchNotFound(_))));
    }

    #[test]
    fn test_read_file_at_branch_directory_is_not_a_file() {
        let (_dir, repo) = init_repo();
        repo.ensure_checkpoints_branch().unwrap();
        repo.commit_files_on_branch(CHECKPOINTS_BRANCH, "m", &files(&[("aa/bb/c.txt", "c")]))
            .unwrap();

        let result = repo.read_file_at_branch(CHECKPOINTS_BRANCH, "aa/bb");
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_branches_with_prefix_and_delete() {
        let (_dir, repo) = init_repo();
        repo.ensure_checkpoints_branch().unwrap();
        let head = repo.raw().head().unwrap().peel_to_commit().unwrap();
        repo.raw().branch("entire/abc-123", &head, false).unwrap();
        repo.raw().branch("feature", &head, false).unwrap();

        assert_eq!(
            repo.list_branches_with_prefix("entire/").unwrap(),
            vec!["entire/abc-123", CHECKPOINTS_BRANCH]
        );
        assert_eq!(repo.shadow_branches().unwrap(), vec!["entire/abc-123"]);

        repo.delete_branch("entire/abc-123").unwrap();
        assert!(repo.shadow_branches().unwrap().is_empty());
        assert!(matches!(
            repo.delete_branch("entire/abc-123"),
            Err(Error::BranchNotFound(_))
        ));
    }

    #[test]
    fn test_append_trailer_is_idempotent() {
        let (_dir, repo) = init_repo();

        assert!(repo.append_trailer(TRAILER_CHECKPOINT, "a3b2c4d5e6f7").unwrap());
        let amended_head = repo.head_commit_hash().unwrap();
        assert!(!repo.append_trailer(TRAILER_CHECKPOINT, "ffffffffffff").unwrap());

        assert_eq!(repo.head_commit_hash().unwrap(), amended_head);
        assert_eq!(repo.checkpoint_from_commit("HEAD").unwrap(), "a3b2c4d5e6f7");
        assert_eq!(repo.find_checkpoint_trailer("main").unwrap(), "a3b2c4d5e6f7");
        assert_eq!(repo.current_branch().unwrap(), "main");
        assert_eq!(repo.commit_hash("main").unwrap(), amended_head);
    }

    #[test]
    fn test_checkpoint_from_commit_without_trailer() {
        let (_dir, repo) = init_repo();
        assert!(matches!(
            repo.checkpoint_from_commit("HEAD"),
            Err(Error::NoCheckpointTrailer(_))
        ));
    }

    #[test]
    fn test_checkout_revision_detaches() {
        let (_dir, repo) = init_repo();
        let hash = repo.head_commit_hash().unwrap();

        repo.checkout(&hash, false).unwrap();
        assert_eq!(repo.current_branch().unwrap(), "HEAD");

        repo.checkout("main", false).unwrap();
        assert_eq!(repo.current_branch().unwrap(), "main");
    }

    #[test]
    fn test_validate_store_path() {
        assert!(validate_store_path("a3/b2c4d5e6f7/metadata.json").is_ok());
        assert!(validate_store_path("").is_err());
        assert!(validate_store_path("/abs").is_err());
        assert!(validate_store_path("a//b").is_err());
        assert!(validate_store_path("a/../b").is_err());
        assert!(validate_store_path(".git/config").is_err());
    }
}
