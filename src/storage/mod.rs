//! Storage layer for Entire
//!
//! Checkpoints live in an append-only content store addressed by
//! slash-separated paths. The production backend is a dedicated git branch
//! ([`BranchStore`]); [`DirStore`] keeps the same layout in a plain
//! directory.

pub mod branch;
pub mod dir;
pub mod models;

pub use branch::BranchStore;
pub use dir::DirStore;
pub use models::*;

use std::collections::BTreeMap;

use crate::error::Result;

/// A batch of files keyed by store path.
pub type FileBatch = BTreeMap<String, Vec<u8>>;

/// Append-only key/value store over slash-separated paths.
pub trait ContentStore {
    /// Writes every file in `batch` atomically: after the call either all
    /// of them are visible or none are.
    fn put(&self, message: &str, batch: &FileBatch) -> Result<()>;

    /// Reads one file. Missing paths are reported as a not-found error.
    fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// Lists stored paths starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Whether the store has been initialized and can accept writes.
    fn is_ready(&self) -> bool;
}

/// True for relative paths with no empty, `.`, `..` or `.git` segments.
pub fn is_valid_store_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != ".." && seg != ".git")
}
