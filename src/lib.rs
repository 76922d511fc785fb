//! Entire - AI agent sessions as git checkpoints
//!
//! Entire records the transcript of the coding agent session behind each
//! commit and stores it on a dedicated orphan branch
//! (`entire/checkpoints/v1`) of the same repository. Commits are linked to
//! their checkpoint through an `Entire-Checkpoint` trailer.

pub mod attribution;
pub mod capture;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod storage;
pub mod strategy;

pub use error::{Error, Result};
