//! Coding-agent integrations.
//!
//! Each agent knows where its transcripts live, how to tell which session
//! is currently active for a repository, and how to turn a transcript into
//! [`SessionData`]. Agents are collected in an [`AgentRegistry`] that is
//! built once at startup and passed to whoever needs it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::models::SessionData;

/// Claude Code transcripts under `~/.claude/projects/`.
pub mod claude_code;

pub use claude_code::ClaudeCodeAgent;

/// Static description of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentInfo {
    /// Registry key, also stored as the session's agent name
    pub name: &'static str,
    pub description: &'static str,
}

/// Where an agent keeps session transcripts for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPaths {
    pub session_dir: PathBuf,
    /// Glob matched against file names in `session_dir`
    pub pattern: &'static str,
}

/// A coding agent whose transcripts can be captured.
pub trait Agent: Send + Sync {
    fn info(&self) -> AgentInfo;

    /// Returns the id of the most recently active session for `repo_dir`.
    ///
    /// # Errors
    ///
    /// [`Error::NoActiveSession`] when no transcript was modified recently.
    fn detect(&self, repo_dir: &Path) -> Result<String>;

    /// Parses a session and any sub-agent transcripts it spawned.
    fn parse_session(&self, session_id: &str, repo_dir: &Path) -> Result<SessionData>;

    fn session_paths(&self, repo_dir: &Path) -> AgentPaths;

    /// Path of the main transcript file of a session.
    fn transcript_path(&self, session_id: &str, repo_dir: &Path) -> PathBuf;
}

/// Agents by name.
#[derive(Default)]
pub struct AgentRegistry {
    agents: BTreeMap<&'static str, Box<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an agent, replacing any agent registered under the same name.
    pub fn register(&mut self, agent: Box<dyn Agent>) {
        self.agents.insert(agent.info().name, agent);
    }

    /// Looks up an agent by name.
    pub fn get(&self, name: &str) -> Result<&dyn Agent> {
        self.agents
            .get(name)
            .map(|a| a.as_ref())
            .ok_or_else(|| Error::UnknownAgent(name.to_string()))
    }

    /// All registered agents in name order.
    pub fn all(&self) -> Vec<&dyn Agent> {
        self.agents.values().map(|a| a.as_ref()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.agents.keys().copied().collect()
    }

    /// First agent, in name order, with an active session for `repo_dir`.
    pub fn detect_any(&self, repo_dir: &Path) -> Option<(&dyn Agent, String)> {
        self.agents.values().find_map(|agent| {
            match agent.detect(repo_dir) {
                Ok(session_id) if !session_id.is_empty() => Some((agent.as_ref(), session_id)),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!("{} not active: {}", agent.info().name, e);
                    None
                }
            }
        })
    }
}

/// Registry with every built-in agent.
pub fn default_registry() -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    registry.register(Box::new(ClaudeCodeAgent::new()));
    registry
}

#[cfg(test)]
mod test_common;
