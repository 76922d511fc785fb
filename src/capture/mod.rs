//! Session capture from AI coding agents.
//!
//! # Supported Agents
//!
//! - Claude Code - Parses JSONL files from `~/.claude/projects/`

/// Agent trait, registry and per-agent implementations.
pub mod agents;

/// Markdown and prompt renderings stored alongside transcripts.
pub mod render;

/// Canonical line-delimited JSON transcript parser.
pub mod transcript;

pub use agents::{default_registry, Agent, AgentInfo, AgentPaths, AgentRegistry};
pub use render::{prompt_excerpt, render_context};
