//! On-disk layout of a built vector store.
//!
//! A store is two co-located artifacts under one directory:
//!
//! - `vectors.index` - the flat index snapshot, stamped with the build id
//! - `metadata.json` - chunk records in index order plus build metadata
//!
//! Both carry the same build id. They are loaded together or not at all.

use crate::types::{AppError, ChunkRecord, Result};
use chrono::{DateTime, Utc};
use flat_vector::persistence::{read_index, stage_bytes, stage_index};
use flat_vector::FlatIndex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const INDEX_FILE: &str = "vectors.index";
pub const METADATA_FILE: &str = "metadata.json";

/// Current metadata file format.
const METADATA_FORMAT_VERSION: u32 = 1;

/// Everything recorded about a build next to its chunk records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub build_id: String,
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MetadataFile {
    format_version: u32,
    #[serde(flatten)]
    info: BuildInfo,
    records: Vec<ChunkRecord>,
}

/// A fully materialised store: index, parallel records, and build info.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub info: BuildInfo,
    pub index: FlatIndex,
    pub records: Vec<ChunkRecord>,
}

impl StoreSnapshot {
    /// Pair an index with its records, enforcing one record per vector.
    pub fn new(info: BuildInfo, index: FlatIndex, records: Vec<ChunkRecord>) -> Result<Self> {
        if index.len() != records.len() {
            return Err(AppError::ShapeMismatch(format!(
                "index holds {} vectors but {} metadata records were supplied",
                index.len(),
                records.len()
            )));
        }
        if let Some(d) = index.dimensions() {
            if d != info.dimensions {
                return Err(AppError::ShapeMismatch(format!(
                    "index has {} dimensions, build info records {}",
                    d, info.dimensions
                )));
            }
        }
        Ok(Self {
            info,
            index,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Paths of the two artifacts under a persist directory.
#[derive(Debug, Clone)]
pub struct StoreFiles {
    dir: PathBuf,
}

impl StoreFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// True when both artifacts are present.
    pub fn exists(&self) -> bool {
        self.index_path().is_file() && self.metadata_path().is_file()
    }

    /// Write both artifacts.
    ///
    /// Both are staged as temp siblings first and renamed into place only
    /// once both are fully on disk. A failed save leaves the previous pair
    /// untouched and removes the temp files.
    #[instrument(skip(self, snapshot), fields(dir = ?self.dir, records = snapshot.len()))]
    pub async fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let metadata = MetadataFile {
            format_version: METADATA_FORMAT_VERSION,
            info: snapshot.info.clone(),
            records: snapshot.records.clone(),
        };
        let json = serde_json::to_vec_pretty(&metadata)
            .map_err(|e| AppError::Internal(format!("Failed to serialize metadata: {}", e)))?;

        let staged_index =
            stage_index(&self.index_path(), &snapshot.index, &snapshot.info.build_id).await?;
        let staged_metadata = stage_bytes(&self.metadata_path(), &json).await?;

        staged_index.commit().await?;
        staged_metadata.commit().await?;

        info!(
            build_id = %snapshot.info.build_id,
            vectors = snapshot.index.len(),
            "Saved vector store"
        );
        Ok(())
    }

    /// Read both artifacts and check that they describe the same build.
    #[instrument(skip(self), fields(dir = ?self.dir))]
    pub async fn load(&self) -> Result<StoreSnapshot> {
        let index_path = self.index_path();
        let metadata_path = self.metadata_path();

        for path in [&index_path, &metadata_path] {
            if !path.is_file() {
                return Err(AppError::CorruptOrMissingStore(format!(
                    "missing artifact {}",
                    path.display()
                )));
            }
        }

        let (index, stamp) = read_index(&index_path).await.map_err(|e| {
            AppError::CorruptOrMissingStore(format!("{}: {}", index_path.display(), e))
        })?;

        let raw = tokio::fs::read(&metadata_path).await.map_err(|e| {
            AppError::CorruptOrMissingStore(format!("{}: {}", metadata_path.display(), e))
        })?;
        let metadata: MetadataFile = serde_json::from_slice(&raw).map_err(|e| {
            AppError::CorruptOrMissingStore(format!("{}: {}", metadata_path.display(), e))
        })?;

        if metadata.format_version != METADATA_FORMAT_VERSION {
            return Err(AppError::CorruptOrMissingStore(format!(
                "unsupported metadata format version {}",
                metadata.format_version
            )));
        }
        if stamp != metadata.info.build_id {
            return Err(AppError::CorruptOrMissingStore(format!(
                "index belongs to build {} but metadata to build {}",
                stamp, metadata.info.build_id
            )));
        }

        let snapshot = StoreSnapshot::new(metadata.info, index, metadata.records)
            .map_err(|e| AppError::CorruptOrMissingStore(e.to_string()))?;

        debug!(vectors = snapshot.len(), "Loaded vector store artifacts");
        Ok(snapshot)
    }
}
