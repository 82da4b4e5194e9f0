//! Common types for flat-vector.

use serde::{Deserialize, Serialize};

/// One search hit: the stored vector's ordinal position and its squared L2
/// distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Insertion-order position of the stored vector.
    pub position: usize,
    /// Squared Euclidean distance to the query (lower is closer).
    pub distance: f32,
}
