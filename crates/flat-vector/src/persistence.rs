//! Persistence layer for flat-vector.
//!
//! An index is written as a single postcard-encoded snapshot. Each snapshot
//! carries a caller-chosen `stamp` so that a companion file written in the
//! same save can be matched against it on load.

use crate::error::{Error, Result};
use crate::index::FlatIndex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Current on-disk snapshot format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct IndexSnapshot {
    format_version: u32,
    stamp: String,
    index: FlatIndex,
}

/// Encode `index` and stage it next to `path`.
///
/// Nothing at `path` changes until the returned [`StagedFile`] is committed.
pub async fn stage_index(path: &Path, index: &FlatIndex, stamp: &str) -> Result<StagedFile> {
    let snapshot = IndexSnapshot {
        format_version: FORMAT_VERSION,
        stamp: stamp.to_string(),
        index: index.clone(),
    };
    let bytes = postcard::to_allocvec(&snapshot)
        .map_err(|e| Error::Persistence(format!("Failed to encode index: {}", e)))?;

    let staged = stage_bytes(path, &bytes).await?;
    debug!(path = ?path, vectors = index.len(), bytes = bytes.len(), "Staged index");
    Ok(staged)
}

/// Read an index snapshot previously written by [`stage_index`].
///
/// Returns the index together with its stamp.
pub async fn read_index(path: &Path) -> Result<(FlatIndex, String)> {
    let bytes = tokio::fs::read(path).await?;
    let snapshot: IndexSnapshot = postcard::from_bytes(&bytes)
        .map_err(|e| Error::Persistence(format!("Failed to decode index: {}", e)))?;

    if snapshot.format_version != FORMAT_VERSION {
        return Err(Error::Persistence(format!(
            "Unsupported index format version {} (expected {})",
            snapshot.format_version, FORMAT_VERSION
        )));
    }

    let index = snapshot.index;
    if !index.is_well_formed() {
        return Err(Error::Persistence(
            "Index buffer does not match its dimensions".to_string(),
        ));
    }

    debug!(path = ?path, vectors = index.len(), "Loaded index");
    Ok((index, snapshot.stamp))
}

/// A fully written temporary sibling of `target`, waiting to be renamed
/// into place.
///
/// Dropping it without [`StagedFile::commit`] removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Rename the temporary file over the target.
    pub async fn commit(mut self) -> Result<()> {
        tokio::fs::rename(&self.tmp, &self.target).await?;
        self.committed = true;
        info!(path = ?self.target, "Committed file");
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = std::fs::remove_file(&self.tmp) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = ?self.tmp, error = %e, "Failed to remove staged file");
                }
            }
        }
    }
}

/// Write `bytes` to a temporary sibling of `path` and sync it to disk.
///
/// On failure the partial temporary file is removed.
pub async fn stage_bytes(path: &Path, bytes: &[u8]) -> Result<StagedFile> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let staged = StagedFile {
        tmp: temp_path(path),
        target: path.to_path_buf(),
        committed: false,
    };
    let mut file = tokio::fs::File::create(&staged.tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(staged)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
