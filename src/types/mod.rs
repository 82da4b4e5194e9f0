use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============= Corpus Types =============

/// A raw ingested unit of text with a provenance label (usually a file path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub source: String,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

/// A contiguous character window of one [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    /// Position of the source document in the build's input sequence.
    pub document_index: usize,
    /// Position of this chunk within its document.
    pub chunk_index: usize,
    /// Offset of the first character, counted in chars.
    pub start_char: usize,
}

/// Metadata record persisted at the same ordinal as the chunk's vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
}

impl From<&Chunk> for ChunkRecord {
    fn from(chunk: &Chunk) -> Self {
        Self {
            text: chunk.text.clone(),
            source: chunk.source.clone(),
            chunk_index: chunk.chunk_index,
        }
    }
}

// ============= Retrieval Types =============

/// One retrieved chunk, ranked by squared L2 distance (lower is closer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub position: usize,
    pub distance: f32,
    pub text: String,
    pub source: String,
}

/// A synthesized answer along with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<QueryHit>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Index is empty")]
    EmptyIndex,

    #[error("Vector store is not ready: {0}")]
    NotReady(String),

    #[error("Persisted store is corrupt or missing: {0}")]
    CorruptOrMissingStore(String),

    #[error("Embedding model mismatch: store was built with '{stored}', configured '{configured}'")]
    ModelMismatch { stored: String, configured: String },

    #[error("No chunks produced from {documents} document(s)")]
    EmptyCorpus { documents: usize },

    #[error("Backend call '{operation}' timed out after {timeout:?}")]
    BackendTimeout {
        operation: String,
        timeout: Duration,
    },

    #[error("Backend failure: {0}")]
    BackendFailure(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a caller may reasonably retry the operation (with backoff).
    ///
    /// Only backend failures qualify; configuration and shape errors are
    /// caller misuse.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::BackendTimeout { .. } | AppError::BackendFailure(_) | AppError::LLM(_)
        )
    }
}

impl From<flat_vector::Error> for AppError {
    fn from(err: flat_vector::Error) -> Self {
        match err {
            flat_vector::Error::DimensionMismatch { expected, actual } => AppError::ShapeMismatch(
                format!("vector has {} dimensions, index expects {}", actual, expected),
            ),
            flat_vector::Error::InvalidVector(msg) => AppError::ShapeMismatch(msg),
            flat_vector::Error::EmptyIndex => AppError::EmptyIndex,
            flat_vector::Error::Persistence(msg) => AppError::CorruptOrMissingStore(msg),
            flat_vector::Error::Io(e) => AppError::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::BackendFailure("503".to_string()).is_retryable());
        assert!(AppError::BackendTimeout {
            operation: "embed".to_string(),
            timeout: Duration::from_secs(1),
        }
        .is_retryable());
        assert!(!AppError::Configuration("overlap".to_string()).is_retryable());
        assert!(!AppError::ShapeMismatch("dims".to_string()).is_retryable());
        assert!(!AppError::NotReady("empty".to_string()).is_retryable());
    }

    #[test]
    fn test_flat_vector_error_mapping() {
        let err: AppError = flat_vector::Error::DimensionMismatch {
            expected: 384,
            actual: 3,
        }
        .into();
        assert!(matches!(err, AppError::ShapeMismatch(ref m) if m.contains("384")));

        let err: AppError = flat_vector::Error::EmptyIndex.into();
        assert!(matches!(err, AppError::EmptyIndex));

        let err: AppError = flat_vector::Error::Persistence("bad".to_string()).into();
        assert!(matches!(err, AppError::CorruptOrMissingStore(_)));
    }

    #[test]
    fn test_chunk_record_from_chunk() {
        let chunk = Chunk {
            text: "hello".to_string(),
            source: "a.txt".to_string(),
            document_index: 2,
            chunk_index: 1,
            start_char: 400,
        };
        let record = ChunkRecord::from(&chunk);
        assert_eq!(record.text, "hello");
        assert_eq!(record.source, "a.txt");
        assert_eq!(record.chunk_index, 1);
    }
}
