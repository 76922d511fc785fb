//! Per-commit diff helpers used for attribution.
//!
//! A commit is diffed against its first parent; the initial commit has no
//! parent and is diffed against the empty tree instead.

use git2::{DiffFormat, Patch};
use std::collections::BTreeMap;

use super::Repository;
use crate::error::Result;

impl Repository {
    /// Paths touched by a commit.
    pub fn diff_files(&self, rev: &str) -> Result<Vec<String>> {
        let diff = self.commit_diff(rev)?;
        Ok(diff
            .deltas()
            .filter_map(|d| d.new_file().path().or_else(|| d.old_file().path()))
            .map(|p| p.to_string_lossy().to_string())
            .collect())
    }

    /// Unified diff text of a commit.
    pub fn diff_content(&self, rev: &str) -> Result<String> {
        let diff = self.commit_diff(rev)?;
        let mut out = String::new();

        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                out.push(line.origin());
            }
            out.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        Ok(out)
    }

    /// Added and removed line counts of a commit.
    pub fn diff_lines_changed(&self, rev: &str) -> Result<(u64, u64)> {
        let stats = self.commit_diff(rev)?.stats()?;
        Ok((stats.insertions() as u64, stats.deletions() as u64))
    }

    /// Added line count per touched path.
    pub fn diff_added_lines_by_file(&self, rev: &str) -> Result<BTreeMap<String, u64>> {
        let diff = self.commit_diff(rev)?;
        let mut added = BTreeMap::new();

        for idx in 0..diff.deltas().len() {
            let Some(patch) = Patch::from_diff(&diff, idx)? else {
                continue;
            };
            let delta = patch.delta();
            let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) else {
                continue;
            };
            let (_, additions, _) = patch.line_stats()?;
            *added
                .entry(path.to_string_lossy().to_string())
                .or_insert(0) += additions as u64;
        }

        Ok(added)
    }

    fn commit_diff(&self, rev: &str) -> Result<git2::Diff<'_>> {
        let repo = self.raw();
        let commit = repo.revparse_single(rev)?.peel_to_commit()?;
        let tree = commit.tree()?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        Ok(repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn commit_file(raw: &git2::Repository, dir: &Path, name: &str, content: &str, msg: &str) {
        std::fs::write(dir.join(name), content).unwrap();
        let mut index = raw.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree = raw.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
        let parent = raw.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        raw.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parents)
            .unwrap();
    }

    fn setup() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let raw = git2::Repository::init(dir.path()).unwrap();
        commit_file(&raw, dir.path(), "a.txt", "one\ntwo\n", "first");
        commit_file(&raw, dir.path(), "b.txt", "x\ny\nz\n", "second");
        commit_file(&raw, dir.path(), "a.txt", "one\n", "third");
        let repo = Repository::open(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_diff_initial_commit_uses_empty_tree() {
        let (_dir, repo) = setup();
        assert_eq!(repo.diff_files("HEAD~2").unwrap(), vec!["a.txt"]);
        assert_eq!(repo.diff_lines_changed("HEAD~2").unwrap(), (2, 0));
    }

    #[test]
    fn test_diff_files_and_lines() {
        let (_dir, repo) = setup();
        assert_eq!(repo.diff_files("HEAD~1").unwrap(), vec!["b.txt"]);
        assert_eq!(repo.diff_lines_changed("HEAD~1").unwrap(), (3, 0));
        assert_eq!(repo.diff_lines_changed("HEAD").unwrap(), (0, 1));
    }

    #[test]
    fn test_diff_content() {
        let (_dir, repo) = setup();
        let content = repo.diff_content("HEAD").unwrap();
        assert!(content.contains("a.txt"));
        assert!(content.contains("-two"));
    }

    #[test]
    fn test_diff_added_lines_by_file() {
        let (_dir, repo) = setup();
        let added = repo.diff_added_lines_by_file("HEAD~1").unwrap();
        assert_eq!(added.get("b.txt"), Some(&3));
    }
}
