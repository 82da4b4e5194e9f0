//! Exact (brute-force) L2 index.
//!
//! Vectors are stored row-major in one contiguous buffer. A vector's ordinal
//! position is its insertion order, and that position is the only key the
//! index hands back: callers keep any payload in a parallel array.

use crate::distance::squared_l2;
use crate::error::{Error, Result};
use crate::types::Neighbor;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Flat squared-L2 nearest-neighbor index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    /// Established dimensionality; `None` until the first vector arrives.
    dimensions: Option<usize>,
    /// Row-major vector storage, `len * dimensions` floats.
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index whose dimensionality is fixed by the first `add`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with a fixed dimensionality.
    pub fn with_dimensions(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidVector("Dimensions must be > 0".to_string()));
        }
        Ok(Self {
            dimensions: Some(dimensions),
            data: Vec::new(),
        })
    }

    /// Get the vector dimensions, if established.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Get the number of vectors in the index.
    pub fn len(&self) -> usize {
        match self.dimensions {
            Some(d) => self.data.len() / d,
            None => 0,
        }
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the buffer holds a whole number of vectors of a non-zero width.
    pub(crate) fn is_well_formed(&self) -> bool {
        match self.dimensions {
            Some(0) => false,
            Some(d) => self.data.len() % d == 0,
            None => self.data.is_empty(),
        }
    }

    /// Borrow the stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let d = self.dimensions?;
        let start = position.checked_mul(d)?;
        let end = start.checked_add(d)?;
        self.data.get(start..end)
    }

    /// Append vectors to the index.
    ///
    /// The batch is validated as a whole before anything is stored, so a
    /// rejected batch leaves the index untouched. Returns the position of the
    /// first appended vector.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<usize> {
        let first_position = self.len();
        let Some(first) = vectors.first() else {
            return Ok(first_position);
        };

        let dimensions = self.dimensions.unwrap_or(first.len());
        if dimensions == 0 {
            return Err(Error::InvalidVector("Vector is empty".to_string()));
        }

        for (offset, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(Error::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidVector(format!(
                    "Vector at batch offset {} contains NaN or Inf",
                    offset
                )));
            }
        }

        self.dimensions = Some(dimensions);
        self.data.reserve(vectors.len() * dimensions);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }

        debug!(
            added = vectors.len(),
            total = self.len(),
            dimensions,
            "Appended vectors"
        );
        Ok(first_position)
    }

    /// Return the `k` stored vectors closest to `query`, nearest first.
    ///
    /// Distances are squared L2. Equal distances keep insertion order. When
    /// fewer than `k` vectors are stored, all of them are returned.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let Some(dimensions) = self.dimensions.filter(|_| !self.data.is_empty()) else {
            return Err(Error::EmptyIndex);
        };

        if query.len() != dimensions {
            return Err(Error::DimensionMismatch {
                expected: dimensions,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidVector(
                "Query vector contains NaN or Inf".to_string(),
            ));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(dimensions)
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: squared_l2(query, row),
            })
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, compare_neighbors);
            scored.truncate(k);
        }
        scored.sort_by(compare_neighbors);

        trace!(k, returned = scored.len(), "Flat search complete");
        Ok(scored)
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.position.cmp(&b.position))
}
