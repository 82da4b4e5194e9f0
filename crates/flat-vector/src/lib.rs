//! # flat-vector
//!
//! An exact, exhaustive nearest-neighbor index over dense `f32` vectors,
//! ranked by squared Euclidean distance, with binary snapshot persistence.
//!
//! ## Quick Start
//!
//! ```rust
//! use flat_vector::FlatIndex;
//!
//! let mut index = FlatIndex::new();
//! index.add(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
//!
//! let hits = index.search(&[0.9, 0.1], 1).unwrap();
//! assert_eq!(hits[0].position, 0);
//! ```
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  FlatIndex                    │
//! │  dimensions: Option<usize>                    │
//! │  data: [v0 ... | v1 ... | v2 ... ]  row-major │
//! └──────────────────────────────────────────────┘
//!              │ stage_index / read_index
//!              ▼
//!   postcard snapshot { format_version, stamp, index }
//! ```
//!
//! Positions are insertion order and are the join key to any payload the
//! caller stores alongside the index.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod index;
pub mod persistence;
pub mod types;

pub use error::{Error, Result};
pub use index::FlatIndex;
pub use types::Neighbor;
