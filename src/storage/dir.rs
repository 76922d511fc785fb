//! Content store backed by a plain directory.
//!
//! A batch is first written to a staging directory next to the store and
//! then moved into place. If any file fails to stage, nothing is moved; if
//! a move fails, the files already moved by that batch are removed again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{is_valid_store_path, ContentStore, FileBatch};
use crate::error::{Error, Result};

const STAGING_PREFIX: &str = ".staging-";

/// Stores files under a root directory using the store path as the
/// relative file path.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the root directory if needed.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stage(&self, staging: &Path, batch: &FileBatch) -> Result<()> {
        for (path, data) in batch {
            if !is_valid_store_path(path) {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid store path: {path:?}"),
                )));
            }
            let target = staging.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, data)?;
        }
        Ok(())
    }

    fn publish(&self, staging: &Path, batch: &FileBatch) -> Result<()> {
        let mut moved: Vec<PathBuf> = Vec::new();

        for path in batch.keys() {
            let target = self.root.join(path);
            let result = target
                .parent()
                .map_or(Ok(()), fs::create_dir_all)
                .and_then(|_| fs::rename(staging.join(path), &target));

            if let Err(e) = result {
                for done in &moved {
                    if let Err(cleanup) = fs::remove_file(done) {
                        tracing::warn!("Failed to roll back {}: {}", done.display(), cleanup);
                    }
                }
                return Err(e.into());
            }
            moved.push(target);
        }

        Ok(())
    }
}

impl ContentStore for DirStore {
    fn put(&self, message: &str, batch: &FileBatch) -> Result<()> {
        let staging = self
            .root
            .join(format!("{STAGING_PREFIX}{:08x}", rand::random::<u32>()));

        let result = self
            .stage(&staging, batch)
            .and_then(|_| self.publish(&staging, batch));

        if staging.exists() {
            if let Err(e) = fs::remove_dir_all(&staging) {
                tracing::warn!("Failed to remove staging dir {}: {}", staging.display(), e);
            }
        }

        if result.is_ok() {
            tracing::debug!("Stored {} files ({})", batch.len(), message);
        }
        result
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        if !is_valid_store_path(path) {
            return Err(not_found(&self.root, path));
        }
        match fs::read(self.root.join(path)) {
            Ok(data) => Ok(data),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::IsADirectory) => {
                Err(not_found(&self.root, path))
            }
            Err(e) if self.root.join(path).is_dir() => {
                tracing::debug!("{} is a directory: {}", path, e);
                Err(not_found(&self.root, path))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut files = Vec::new();
        if self.root.is_dir() {
            collect_files(&self.root, "", &mut files)?;
        }
        files.retain(|f| f.starts_with(prefix));
        files.sort();
        Ok(files)
    }

    fn is_ready(&self) -> bool {
        self.root.is_dir()
    }
}

fn not_found(root: &Path, path: &str) -> Error {
    Error::FileNotFound {
        branch: root.display().to_string(),
        path: path.to_string(),
    }
}

fn collect_files(dir: &Path, rel: &str, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if rel.is_empty() && name.starts_with(STAGING_PREFIX) {
            continue;
        }

        let path = format!("{rel}{name}");
        if entry.file_type()?.is_dir() {
            collect_files(&entry.path(), &format!("{path}/"), out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
