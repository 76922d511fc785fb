//! Core data models for Entire
//!
//! These are the values persisted on the checkpoints branch and the
//! canonical session representation produced by the transcript parser,
//! independent of any specific agent's on-disk format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// A Checkpoint is an immutable record of one or more agent sessions and
/// the commit context they were captured in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// 12 lowercase-hex characters
    pub id: String,

    /// Commit the checkpoint is tied to (empty if captured before any commit)
    #[serde(default)]
    pub commit_hash: String,

    /// Branch checked out when the checkpoint was captured
    #[serde(default)]
    pub branch: String,

    /// Configured git author name
    #[serde(default)]
    pub author: String,

    /// Commit message, or a synthetic message for agent-triggered checkpoints
    #[serde(default)]
    pub message: String,

    /// Set by the store at creation time
    pub created_at: DateTime<Utc>,

    /// Name of the strategy that produced this checkpoint
    #[serde(default)]
    pub strategy: String,

    /// Sessions in assignment order
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,

    /// AI/human line share, when it could be computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
}

impl CheckpointMetadata {
    /// Creates metadata for a new checkpoint. `created_at` is overwritten by
    /// the store when the checkpoint is written.
    pub fn new(
        id: impl Into<String>,
        commit_hash: impl Into<String>,
        branch: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
        strategy: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            commit_hash: commit_hash.into(),
            branch: branch.into(),
            author: author.into(),
            message: message.into(),
            created_at: Utc::now(),
            strategy: strategy.into(),
            sessions: Vec::new(),
            attribution: None,
        }
    }

    /// Token usage summed over every session in the checkpoint.
    pub fn total_usage(&self) -> TokenUsage {
        self.sessions
            .iter()
            .fold(TokenUsage::default(), |acc, s| acc + s.token_usage)
    }
}

/// Lightweight view of a session inside a checkpoint's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// 0-based position within the checkpoint
    pub index: usize,
    pub agent_name: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

/// Metadata stored alongside each session's transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub agent_name: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub token_usage: TokenUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionMetadata {
    /// Metadata for a session whose agent could not be determined.
    pub fn unknown() -> Self {
        Self {
            agent_name: "unknown".to_string(),
            ..Default::default()
        }
    }
}

/// Token consumption. All counters are additive across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation: u64,
    #[serde(default)]
    pub cache_reads: u64,
    #[serde(default)]
    pub api_calls: u64,
}

impl TokenUsage {
    /// Input + output tokens, ignoring cache traffic.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Counters saturate at `u64::MAX` instead of wrapping.
impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.saturating_add(rhs.input_tokens),
            output_tokens: self.output_tokens.saturating_add(rhs.output_tokens),
            cache_creation: self.cache_creation.saturating_add(rhs.cache_creation),
            cache_reads: self.cache_reads.saturating_add(rhs.cache_reads),
            api_calls: self.api_calls.saturating_add(rhs.api_calls),
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

/// Share of a commit's added lines attributed to an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub agent_percent: f64,
    pub agent_lines: u64,
    pub total_lines: u64,
}

/// Parsed data from one agent session, before it is bundled for storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub id: String,
    pub agent_name: String,

    /// Timestamp of the first event, if it could be parsed
    pub started_at: Option<DateTime<Utc>>,

    /// Timestamp of the last event, if it could be parsed
    pub ended_at: Option<DateTime<Utc>>,

    pub prompts: Vec<Prompt>,
    pub responses: Vec<Response>,
    pub tool_calls: Vec<ToolCall>,
    pub token_usage: TokenUsage,

    /// Files named in tool-call inputs, in first-seen order
    #[serde(default)]
    pub files_changed: Vec<String>,

    /// Sub-agent transcripts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_sessions: Vec<SessionData>,
}

impl SessionData {
    /// Token usage of this session plus all nested sessions.
    pub fn total_usage(&self) -> TokenUsage {
        self.nested_sessions
            .iter()
            .fold(self.token_usage, |acc, s| acc + s.total_usage())
    }
}

/// A user prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
}

/// The final (deduplicated) assistant response for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
    pub token_usage: TokenUsage,
}

/// A tool invocation made by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    /// Raw input payload as sent by the agent
    pub input: serde_json::Value,
    pub timestamp: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
}
