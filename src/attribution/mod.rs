//! AI/human line attribution.
//!
//! Lines added in files the agent touched during its session are counted
//! as agent-authored; every other added line is counted as human.

use std::collections::HashSet;
use std::path::Path;

use crate::git::Repository;
use crate::storage::models::Attribution;

/// Builds an attribution from agent and human line counts.
pub fn calculate(agent_lines: u64, human_lines: u64) -> Attribution {
    let total = agent_lines.saturating_add(human_lines);
    if total == 0 {
        return Attribution::default();
    }

    Attribution {
        agent_percent: agent_lines as f64 / total as f64 * 100.0,
        agent_lines,
        total_lines: total,
    }
}

/// Computes attribution for commits of one repository.
pub struct Tracker<'r> {
    repo: &'r Repository,
}

impl<'r> Tracker<'r> {
    pub fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    /// Attribution for `rev`, given the files the agent modified.
    ///
    /// Agent file paths may be absolute or relative to the working tree.
    /// Diff failures are logged and yield an empty attribution.
    pub fn for_commit(&self, rev: &str, agent_files: &[String]) -> Attribution {
        let workdir = self.repo.workdir();
        let agent_set: HashSet<String> = agent_files
            .iter()
            .map(|f| relative_to(&workdir, f))
            .collect();

        let per_file = match self.repo.diff_added_lines_by_file(rev) {
            Ok(per_file) => per_file,
            Err(e) => {
                tracing::debug!("Could not compute diff stats for {}: {}", rev, e);
                return Attribution::default();
            }
        };

        let (agent, human) = per_file
            .iter()
            .fold((0u64, 0u64), |(agent, human), (path, &added)| {
                if agent_set.contains(path) {
                    (agent.saturating_add(added), human)
                } else {
                    (agent, human.saturating_add(added))
                }
            });

        calculate(agent, human)
    }
}

fn relative_to(workdir: &Path, file: &str) -> String {
    Path::new(file)
        .strip_prefix(workdir)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| file.trim_start_matches("./").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_calculate() {
        let a = calculate(146, 54);
        assert_eq!(a.agent_lines, 146);
        assert_eq!(a.total_lines, 200);
        assert!((a.agent_percent - 73.0).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_zero_total() {
        assert_eq!(calculate(0, 0), Attribution::default());
    }

    #[test]
    fn test_calculate_all_human() {
        let a = calculate(0, 10);
        assert_eq!(a.agent_percent, 0.0);
        assert_eq!(a.total_lines, 10);
    }

    fn repo_with_commit() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let raw = git2::Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("agent.rs"), "a\nb\nc\n").unwrap();
        std::fs::write(dir.path().join("human.rs"), "x\n").unwrap();

        let mut index = raw.index().unwrap();
        index.add_path(Path::new("agent.rs")).unwrap();
        index.add_path(Path::new("human.rs")).unwrap();
        index.write().unwrap();
        let tree = raw.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
        raw.commit(Some("HEAD"), &sig, &sig, "add files", &tree, &[])
            .unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_tracker_splits_lines_by_agent_files() {
        let (_dir, repo) = repo_with_commit();
        let tracker = Tracker::new(&repo);

        let a = tracker.for_commit("HEAD", &["agent.rs".to_string()]);
        assert_eq!(a.agent_lines, 3);
        assert_eq!(a.total_lines, 4);
        assert!((a.agent_percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_tracker_accepts_absolute_paths() {
        let (_dir, repo) = repo_with_commit();
        let absolute = repo.workdir().join("agent.rs").to_string_lossy().to_string();

        let a = Tracker::new(&repo).for_commit("HEAD", &[absolute]);
        assert_eq!(a.agent_lines, 3);
    }

    #[test]
    fn test_tracker_diff_failure_credits_nobody() {
        let (_dir, repo) = repo_with_commit();
        let a = Tracker::new(&repo).for_commit("no-such-rev", &["agent.rs".to_string()]);
        assert_eq!(a, Attribution::default());
        assert_eq!(a.total_lines, 0);
    }

    #[test]
    fn test_calculate_saturates() {
        let a = calculate(u64::MAX, 1);
        assert_eq!(a.agent_lines, u64::MAX);
        assert_eq!(a.total_lines, u64::MAX);
        assert!((a.agent_percent - 100.0).abs() < 1e-9);
    }
}
