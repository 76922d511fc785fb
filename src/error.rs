//! Error types for the checkpoint core.
//!
//! Commands wrap these in `anyhow` with operator-facing context; library
//! code returns them directly so callers can match on the failure kind.

use std::path::PathBuf;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures produced by the version-control backend, the checkpoint store,
/// the transcript parser and the capture strategies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No repository metadata was found at or above the given path.
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// The named branch does not exist.
    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    /// The branch exists but has no file at the given path.
    #[error("File {path} not found on branch {branch}")]
    FileNotFound {
        /// Branch that was read.
        branch: String,
        /// Path inside the branch tree.
        path: String,
    },

    /// Writing a commit failed. Carries the operation and libgit2's diagnostic.
    #[error("Commit failed while {context}: {source}")]
    CommitFailed {
        /// What the backend was doing when the commit failed.
        context: String,
        /// Underlying libgit2 error.
        #[source]
        source: git2::Error,
    },

    /// No checkpoint with the given id exists in the store.
    #[error("Checkpoint {0} not found")]
    CheckpointNotFound(String),

    /// Stored metadata or session JSON could not be decoded.
    #[error("Failed to parse {what}: {message}")]
    ParseError {
        /// What was being parsed (usually a store path).
        what: String,
        /// Decoder message.
        message: String,
    },

    /// The commit message carries no checkpoint trailer.
    #[error("No checkpoint trailer on {0}")]
    NoCheckpointTrailer(String),

    /// Strategy name not recognised.
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Agent name not present in the registry.
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// The checkpoint was created before any commit existed.
    #[error("Checkpoint {0} has no associated commit")]
    NoAssociatedCommit(String),

    /// No recently modified session was found for the agent.
    #[error("No active {agent} session found in {}", dir.display())]
    NoActiveSession {
        /// Agent whose session was looked up.
        agent: String,
        /// Directory that was scanned.
        dir: PathBuf,
    },

    /// The operating system random source could not be read.
    #[error("Failed to generate checkpoint ID: {0}")]
    RandomUnavailable(String),

    /// Any other libgit2 failure.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Builds a [`Error::ParseError`] from any displayable decoder error.
    pub fn parse(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Error::ParseError {
            what: what.into(),
            message: err.to_string(),
        }
    }

    /// Returns true when the error means "nothing stored at this location".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound { .. } | Error::BranchNotFound(_) | Error::CheckpointNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_checkpoint_not_found() {
        let err = Error::CheckpointNotFound("a3b2c4d5e6f7".to_string());
        assert!(err.to_string().contains("a3b2c4d5e6f7"));
    }

    #[test]
    fn test_error_display_file_not_found() {
        let err = Error::FileNotFound {
            branch: "entire/checkpoints/v1".to_string(),
            path: "a3/b2c4d5e6f7/metadata.json".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("entire/checkpoints/v1"));
        assert!(msg.contains("metadata.json"));
    }

    #[test]
    fn test_error_is_not_found() {
        assert!(Error::BranchNotFound("x".to_string()).is_not_found());
        assert!(!Error::UnknownStrategy("x".to_string()).is_not_found());
    }

    #[test]
    fn test_parse_error_helper() {
        let err = Error::parse("metadata.json", "expected value at line 1");
        assert!(matches!(err, Error::ParseError { .. }));
        assert!(err.to_string().contains("expected value"));
    }
}
