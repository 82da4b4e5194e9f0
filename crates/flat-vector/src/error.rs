//! Error types for flat-vector.

use thiserror::Error;

/// Result type for flat-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in flat-vector operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Dimension mismatch between a vector and the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality established by the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// Invalid vector (e.g., empty, contains NaN).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Search was issued against an index holding no vectors.
    #[error("Index is empty")]
    EmptyIndex,

    /// Snapshot could not be encoded, decoded, or is from an unknown format.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
