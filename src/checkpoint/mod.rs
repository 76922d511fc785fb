//! Checkpoint identifiers and on-branch layout.
//!
//! A checkpoint with id `a3b2c4d5e6f7` is stored as:
//!
//! ```text
//! a3/b2c4d5e6f7/metadata.json
//! a3/b2c4d5e6f7/<index>/metadata.json
//! a3/b2c4d5e6f7/<index>/full.jsonl
//! a3/b2c4d5e6f7/<index>/context.md
//! a3/b2c4d5e6f7/<index>/prompt.txt
//! a3/b2c4d5e6f7/<index>/content_hash.txt
//! ```

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

pub mod store;

pub use store::{CheckpointStore, SessionBundle};

/// Length of a checkpoint id in hex characters.
pub const ID_LEN: usize = 12;

/// Length of the shard prefix.
const SHARD_LEN: usize = 2;

/// Generates a 12-character lowercase hex checkpoint id from 6 bytes of
/// OS randomness.
///
/// # Errors
///
/// Returns [`Error::RandomUnavailable`] if the OS random source fails.
pub fn generate_id() -> Result<String> {
    let mut bytes = [0u8; ID_LEN / 2];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::RandomUnavailable(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// True for exactly 12 lowercase hex characters.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// The 2-character shard prefix of an id.
pub fn shard(id: &str) -> &str {
    id.get(..SHARD_LEN).unwrap_or(id)
}

/// Everything after the shard prefix.
pub fn shard_remainder(id: &str) -> &str {
    id.get(SHARD_LEN..).unwrap_or("")
}

/// `<shard>/<remainder>/`, or `<id>/` for ids shorter than 12 characters.
pub fn shard_path(id: &str) -> String {
    if id.len() < ID_LEN {
        return format!("{id}/");
    }
    format!("{}/{}/", shard(id), shard_remainder(id))
}

/// Path of the checkpoint-level `metadata.json`.
pub fn metadata_path(id: &str) -> String {
    format!("{}metadata.json", shard_path(id))
}

/// Folder of one session within a checkpoint.
pub fn session_path(id: &str, index: usize) -> String {
    format!("{}{}/", shard_path(id), index)
}

/// Paths of the fixed files kept for each session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFiles {
    pub metadata: String,
    pub full: String,
    pub context: String,
    pub prompt: String,
    pub content_hash: String,
}

/// Returns the file paths for session `index` of checkpoint `id`.
pub fn session_files(id: &str, index: usize) -> SessionFiles {
    let base = session_path(id, index);
    SessionFiles {
        metadata: format!("{base}metadata.json"),
        full: format!("{base}full.jsonl"),
        context: format!("{base}context.md"),
        prompt: format!("{base}prompt.txt"),
        content_hash: format!("{base}content_hash.txt"),
    }
}

/// Recovers a checkpoint id from a stored `<shard>/<remainder>/metadata.json` path.
pub fn id_from_metadata_path(path: &str) -> Option<String> {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [shard, rest, "metadata.json"] => Some(format!("{shard}{rest}")),
        _ => None,
    }
}
