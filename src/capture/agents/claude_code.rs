//! Claude Code session discovery and parsing
//!
//! Claude Code writes one JSONL file per session to
//! `~/.claude/projects/<encoded repo path>/<session id>.jsonl`, where the
//! encoding replaces every `/` with `-`. Sub-agents spawned by a session
//! write their own transcripts to `<session id>/subagents/*.jsonl`.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::{Agent, AgentInfo, AgentPaths};
use crate::capture::transcript;
use crate::error::{Error, Result};
use crate::storage::models::SessionData;

const AGENT_NAME: &str = "claude-code";

/// Sessions modified within this window count as active.
const ACTIVE_WINDOW: Duration = Duration::from_secs(5 * 60);

const SESSION_PATTERN: &str = "*.jsonl";

/// Claude Code transcript reader.
pub struct ClaudeCodeAgent {
    projects_dir: PathBuf,
}

impl ClaudeCodeAgent {
    /// Reads from `~/.claude/projects`.
    pub fn new() -> Self {
        let projects_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".claude")
            .join("projects");
        Self { projects_dir }
    }

    /// Reads from a custom projects directory.
    pub fn with_projects_dir(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    /// Directory holding the session files for `repo_dir`.
    pub fn project_dir(&self, repo_dir: &Path) -> PathBuf {
        self.projects_dir.join(encode_path(repo_dir))
    }

    fn subagent_files(&self, session_id: &str, repo_dir: &Path) -> Vec<PathBuf> {
        jsonl_files(&self.project_dir(repo_dir).join(session_id).join("subagents"))
    }
}

impl Default for ClaudeCodeAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for ClaudeCodeAgent {
    fn info(&self) -> AgentInfo {
        AgentInfo {
            name: AGENT_NAME,
            description: "Claude Code JSONL transcripts from ~/.claude/projects",
        }
    }

    fn detect(&self, repo_dir: &Path) -> Result<String> {
        let dir = self.project_dir(repo_dir);
        let no_session = || Error::NoActiveSession {
            agent: AGENT_NAME.to_string(),
            dir: dir.clone(),
        };

        if !dir.is_dir() {
            return Err(no_session());
        }

        let now = SystemTime::now();
        let mut newest: Option<(SystemTime, String)> = None;

        for path in jsonl_files(&dir) {
            let Ok(modified) = path.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age > ACTIVE_WINDOW {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                newest = Some((modified, stem.to_string()));
            }
        }

        newest.map(|(_, id)| id).ok_or_else(no_session)
    }

    fn parse_session(&self, session_id: &str, repo_dir: &Path) -> Result<SessionData> {
        let path = self.transcript_path(session_id, repo_dir);
        let mut session = transcript::parse_file(&path, AGENT_NAME)?;
        session.id = session_id.to_string();

        for sub in self.subagent_files(session_id, repo_dir) {
            match transcript::parse_file(&sub, AGENT_NAME) {
                Ok(nested) => session.nested_sessions.push(nested),
                Err(e) => {
                    tracing::debug!("Skipping sub-agent transcript {}: {}", sub.display(), e);
                }
            }
        }

        Ok(session)
    }

    fn session_paths(&self, repo_dir: &Path) -> AgentPaths {
        AgentPaths {
            session_dir: self.project_dir(repo_dir),
            pattern: SESSION_PATTERN,
        }
    }

    fn transcript_path(&self, session_id: &str, repo_dir: &Path) -> PathBuf {
        self.project_dir(repo_dir).join(format!("{session_id}.jsonl"))
    }
}

/// Converts a repository path to Claude's directory name.
///
/// `/Users/foo/myrepo` becomes `-Users-foo-myrepo`.
pub fn encode_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim_end_matches('/');
    let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
    trimmed.replace('/', "-")
}

/// `*.jsonl` files directly inside `dir`, sorted. Missing directories
/// yield nothing.
fn jsonl_files(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        SESSION_PATTERN
    );

    let mut files: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|p| p.is_file())
            .collect(),
        Err(e) => {
            tracing::debug!("Invalid session pattern {}: {}", pattern, e);
            Vec::new()
        }
    };
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const REPO: &str = "/home/dev/myrepo";

    fn agent_with_project() -> (TempDir, ClaudeCodeAgent, PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let agent = ClaudeCodeAgent::with_projects_dir(dir.path());
        let project = agent.project_dir(Path::new(REPO));
        fs::create_dir_all(&project).expect("Failed to create project dir");
        (dir, agent, project)
    }

    fn age(path: &Path, secs: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path(Path::new("/Users/foo/myrepo")), "-Users-foo-myrepo");
        assert_eq!(encode_path(Path::new("/Users/foo/myrepo/")), "-Users-foo-myrepo");
        assert_eq!(encode_path(Path::new("/")), "-");
    }

    #[test]
    fn test_project_dir_and_paths() {
        let agent = ClaudeCodeAgent::with_projects_dir("/home/dev/.claude/projects");
        assert_eq!(
            agent.project_dir(Path::new(REPO)),
            PathBuf::from("/home/dev/.claude/projects/-home-dev-myrepo")
        );
        assert_eq!(
            agent.transcript_path("abc", Path::new(REPO)),
            PathBuf::from("/home/dev/.claude/projects/-home-dev-myrepo/abc.jsonl")
        );
        assert_eq!(agent.session_paths(Path::new(REPO)).pattern, "*.jsonl");
    }

    #[test]
    fn test_detect_picks_most_recent_active_session() {
        let (_dir, agent, project) = agent_with_project();
        for (name, secs) in [("old", 600), ("recent", 120), ("newest", 10)] {
            let path = project.join(format!("{name}.jsonl"));
            fs::write(&path, "{}\n").unwrap();
            age(&path, secs);
        }
        fs::write(project.join("notes.txt"), "x").unwrap();

        assert_eq!(agent.detect(Path::new(REPO)).unwrap(), "newest");
    }

    #[test]
    fn test_detect_without_recent_sessions() {
        let (_dir, agent, project) = agent_with_project();
        let path = project.join("stale.jsonl");
        fs::write(&path, "{}\n").unwrap();
        age(&path, 3600);

        assert!(matches!(
            agent.detect(Path::new(REPO)),
            Err(Error::NoActiveSession { .. })
        ));
    }

    #[test]
    fn test_detect_missing_project_dir() {
        let dir = TempDir::new().unwrap();
        let agent = ClaudeCodeAgent::with_projects_dir(dir.path());
        assert!(agent.detect(Path::new("/nowhere")).is_err());
    }

    #[test]
    fn test_parse_session_with_subagents() {
        let (_dir, agent, project) = agent_with_project();
        fs::write(
            project.join("sess-1.jsonl"),
            concat!(
                r#"{"type":"user","timestamp":"2026-01-01T10:00:00Z","message":{"content":"Refactor"}}"#,
                "\n",
                r#"{"type":"assistant","timestamp":"2026-01-01T10:00:05Z","requestId":"r1","message":{"content":"ok"},"usage":{"input_tokens":10,"output_tokens":2}}"#,
                "\n",
            ),
        )
        .unwrap();

        let subagents = project.join("sess-1").join("subagents");
        fs::create_dir_all(&subagents).unwrap();
        fs::write(
            subagents.join("agent-a.jsonl"),
            r#"{"type":"assistant","requestId":"s1","message":{"content":"sub"},"usage":{"input_tokens":4}}"#,
        )
        .unwrap();
        fs::write(subagents.join("broken.jsonl"), "not json at all\n").unwrap();

        let session = agent.parse_session("sess-1", Path::new(REPO)).unwrap();
        assert_eq!(session.id, "sess-1");
        assert_eq!(session.agent_name, "claude-code");
        assert_eq!(session.prompts.len(), 1);
        assert_eq!(session.nested_sessions.len(), 2);
        assert_eq!(session.nested_sessions[0].id, "agent-a");
        assert_eq!(session.nested_sessions[1].prompts.len(), 0);
        assert_eq!(session.total_usage().input_tokens, 14);
    }

    #[test]
    fn test_parse_missing_session_fails() {
        let (_dir, agent, _project) = agent_with_project();
        assert!(agent.parse_session("missing", Path::new(REPO)).is_err());
    }
}
