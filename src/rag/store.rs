//! Vector store orchestrator.
//!
//! [`VectorStore`] ties the chunker, embedding service, flat index and the
//! on-disk artifacts together. A build produces a complete [`StoreSnapshot`]
//! off to the side and publishes it with a single pointer swap, so queries
//! always see either the previous snapshot or the new one.

use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::{Embedder, EmbeddingService};
use crate::rag::persist::{BuildInfo, StoreFiles, StoreSnapshot};
use crate::types::{AppError, ChunkRecord, Document, QueryHit, Result};
use arc_swap::ArcSwapOption;
use chrono::Utc;
use flat_vector::FlatIndex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Construction parameters for a [`VectorStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub persist_dir: PathBuf,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl StoreConfig {
    pub fn new(persist_dir: impl Into<PathBuf>, embedding_model: impl Into<String>) -> Self {
        Self {
            persist_dir: persist_dir.into(),
            embedding_model: embedding_model.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    Empty,
    Building,
    Ready,
}

impl std::fmt::Display for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreState::Empty => write!(f, "empty"),
            StoreState::Building => write!(f, "building"),
            StoreState::Ready => write!(f, "ready"),
        }
    }
}

/// How [`VectorStore::load_or_build`] reached the Ready state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    Loaded,
    Built,
}

/// Clears the building flag however the build exits.
struct BuildingGuard<'a>(&'a AtomicBool);

impl<'a> BuildingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for BuildingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct VectorStore {
    config: StoreConfig,
    chunker: TextChunker,
    embeddings: EmbeddingService,
    files: StoreFiles,
    snapshot: ArcSwapOption<StoreSnapshot>,
    building: AtomicBool,
    write_lock: Mutex<()>,
}

impl VectorStore {
    /// Create an empty store.
    ///
    /// Fails with `Configuration` on bad chunk geometry and with
    /// `ModelMismatch` if the embedder does not serve `config.embedding_model`.
    pub fn new(
        config: StoreConfig,
        embedder: Arc<dyn Embedder>,
        embed_timeout: Duration,
    ) -> Result<Self> {
        let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap)?;

        if embedder.model_id() != config.embedding_model {
            return Err(AppError::ModelMismatch {
                stored: embedder.model_id().to_string(),
                configured: config.embedding_model.clone(),
            });
        }

        let files = StoreFiles::new(config.persist_dir.clone());
        Ok(Self {
            chunker,
            embeddings: EmbeddingService::new(embedder, embed_timeout),
            files,
            config,
            snapshot: ArcSwapOption::empty(),
            building: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn files(&self) -> &StoreFiles {
        &self.files
    }

    pub fn state(&self) -> StoreState {
        if self.building.load(Ordering::SeqCst) {
            StoreState::Building
        } else if self.snapshot.load().is_some() {
            StoreState::Ready
        } else {
            StoreState::Empty
        }
    }

    /// Number of indexed chunks in the published snapshot (0 when none).
    pub fn len(&self) -> usize {
        self.snapshot.load().as_ref().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build info of the published snapshot.
    pub fn info(&self) -> Option<BuildInfo> {
        self.snapshot.load().as_ref().map(|s| s.info.clone())
    }

    /// Rebuild the store from `documents` and persist it.
    ///
    /// The new snapshot is published only after it has been written to disk.
    /// On any error the previously published snapshot keeps serving.
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub async fn build(&self, documents: &[Document]) -> Result<BuildInfo> {
        let _lock = self.write_lock.lock().await;
        let _building = BuildingGuard::enter(&self.building);

        let chunks = self.chunker.chunk_documents(documents);
        if chunks.is_empty() {
            return Err(AppError::EmptyCorpus {
                documents: documents.len(),
            });
        }

        let vectors = self.embeddings.embed_chunks(&chunks).await?;

        let dimensions = vectors.first().map_or(0, Vec::len);
        let mut index = FlatIndex::with_dimensions(dimensions)?;
        index.add(&vectors)?;
        let records: Vec<ChunkRecord> = chunks.iter().map(ChunkRecord::from).collect();

        let info = BuildInfo {
            build_id: Uuid::new_v4().to_string(),
            embedding_model: self.config.embedding_model.clone(),
            dimensions,
            chunk_size: self.config.chunk_size,
            chunk_overlap: self.config.chunk_overlap,
            created_at: Utc::now(),
        };
        let snapshot = StoreSnapshot::new(info.clone(), index, records)?;

        self.files.save(&snapshot).await?;
        self.snapshot.store(Some(Arc::new(snapshot)));

        info!(
            build_id = %info.build_id,
            chunks = chunks.len(),
            dimensions = info.dimensions,
            "Vector store built"
        );
        Ok(info)
    }

    /// Replace the published snapshot with the one on disk.
    ///
    /// On failure the store keeps whatever it was serving before.
    #[instrument(skip(self), fields(dir = ?self.config.persist_dir))]
    pub async fn load(&self) -> Result<BuildInfo> {
        let _lock = self.write_lock.lock().await;

        let snapshot = self.files.load().await?;
        if snapshot.info.embedding_model != self.config.embedding_model {
            return Err(AppError::ModelMismatch {
                stored: snapshot.info.embedding_model.clone(),
                configured: self.config.embedding_model.clone(),
            });
        }
        if snapshot.info.chunk_size != self.config.chunk_size
            || snapshot.info.chunk_overlap != self.config.chunk_overlap
        {
            warn!(
                stored_size = snapshot.info.chunk_size,
                stored_overlap = snapshot.info.chunk_overlap,
                "Persisted store was chunked with different settings; rebuild to apply the current ones"
            );
        }

        let info = snapshot.info.clone();
        let count = snapshot.len();
        self.snapshot.store(Some(Arc::new(snapshot)));

        info!(build_id = %info.build_id, chunks = count, "Vector store loaded");
        Ok(info)
    }

    /// Load the persisted store if both artifacts exist, otherwise build one
    /// from the documents produced by `documents`.
    pub async fn load_or_build<F>(&self, documents: F) -> Result<Startup>
    where
        F: FnOnce() -> Result<Vec<Document>>,
    {
        if self.files.exists() {
            self.load().await?;
            return Ok(Startup::Loaded);
        }

        info!(dir = ?self.config.persist_dir, "No persisted store found, building");
        let documents = documents()?;
        self.build(&documents).await?;
        Ok(Startup::Built)
    }

    /// Embed `text` and return its `k` nearest chunks.
    #[instrument(skip(self, text))]
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<QueryHit>> {
        let snapshot = self.current()?;
        let vector = self.embeddings.embed_query(text).await?;
        Self::search_snapshot(&snapshot, &vector, k)
    }

    /// Return the `k` nearest chunks to a caller-supplied vector.
    pub fn search_vector(&self, vector: &[f32], k: usize) -> Result<Vec<QueryHit>> {
        let snapshot = self.current()?;
        Self::search_snapshot(&snapshot, vector, k)
    }

    fn current(&self) -> Result<Arc<StoreSnapshot>> {
        self.snapshot.load_full().ok_or_else(|| {
            AppError::NotReady(format!(
                "no index loaded (state: {}); run build or load first",
                self.state()
            ))
        })
    }

    fn search_snapshot(snapshot: &StoreSnapshot, vector: &[f32], k: usize) -> Result<Vec<QueryHit>> {
        let neighbors = snapshot.index.search(vector, k)?;

        neighbors
            .into_iter()
            .map(|n| {
                let record = snapshot.records.get(n.position).ok_or_else(|| {
                    AppError::Internal(format!("no metadata record at position {}", n.position))
                })?;
                Ok(QueryHit {
                    position: n.position,
                    distance: n.distance,
                    text: record.text.clone(),
                    source: record.source.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Two-dimensional vectors: `[count of 'a', count of 'b']`.
    struct CountingEmbedder;

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_id(&self) -> &str {
            "counting"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    vec![
                        t.matches('a').count() as f32,
                        t.matches('b').count() as f32,
                    ]
                })
                .collect())
        }
    }

    fn store(dir: &TempDir) -> VectorStore {
        let config = StoreConfig::new(dir.path(), "counting").with_chunking(4, 0);
        VectorStore::new(config, Arc::new(CountingEmbedder), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_rejects_bad_chunking() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path(), "counting").with_chunking(10, 10);
        let result = VectorStore::new(config, Arc::new(CountingEmbedder), Duration::from_secs(1));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_rejects_foreign_embedder() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path(), "all-MiniLM-L6-v2");
        let result = VectorStore::new(config, Arc::new(CountingEmbedder), Duration::from_secs(1));
        assert!(matches!(result, Err(AppError::ModelMismatch { .. })));
    }

    #[tokio::test]
    async fn test_query_before_build_is_not_ready() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.state(), StoreState::Empty);

        let result = store.query("aaaa", 1).await;
        assert!(matches!(result, Err(AppError::NotReady(_))));
        assert!(matches!(
            store.search_vector(&[1.0, 0.0], 1),
            Err(AppError::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn test_build_then_query() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let info = store
            .build(&[Document::new("aaaabbbbabab", "doc.txt")])
            .await
            .unwrap();
        assert_eq!(info.dimensions, 2);
        assert_eq!(store.state(), StoreState::Ready);
        assert_eq!(store.len(), 3);
        assert!(store.files().exists());

        let hits = store.query("bbbb", 2).await.unwrap();
        assert_eq!(hits[0].text, "bbbb");
        assert_eq!(hits[0].position, 1);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].text, "abab");
    }

    #[tokio::test]
    async fn test_empty_corpus_keeps_state() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let result = store.build(&[Document::new("", "empty.txt")]).await;
        assert!(matches!(result, Err(AppError::EmptyCorpus { documents: 1 })));
        assert_eq!(store.state(), StoreState::Empty);
        assert!(!store.files().exists());
    }

    #[tokio::test]
    async fn test_load_or_build_prefers_disk() {
        let dir = TempDir::new().unwrap();
        let first = store(&dir);
        let how = first
            .load_or_build(|| Ok(vec![Document::new("aaaa", "a.txt")]))
            .await
            .unwrap();
        assert_eq!(how, Startup::Built);

        let second = store(&dir);
        let how = second
            .load_or_build(|| panic!("documents should not be read when a store exists"))
            .await
            .unwrap();
        assert_eq!(how, Startup::Loaded);
        assert_eq!(second.len(), 1);
    }
}
