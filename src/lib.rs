//! # superbit
//!
//! Locality-sensitive hashing tables for approximate nearest-neighbor (ANN)
//! search over dense and sparse real-valued vectors.
//!
//! A table is built once over a caller-owned slice of points and is
//! immutable afterwards; keys are positions in that slice. Two hash families
//! are available (random hyperplanes and cross-polytopes), both with
//! multiprobe querying, and candidates are ranked by negative inner product
//! (cosine similarity on unit vectors).
//!
//! ## Quick start
//!
//! ```rust
//! use ndarray::Array1;
//! use superbit::{build_index, DistanceFunction, LshFamily, LshParams};
//!
//! let points: Vec<Array1<f32>> = (0..100)
//!     .map(|i| Array1::from_shape_fn(16, |j| ((i * 16 + j) as f32).sin()))
//!     .collect();
//!
//! let params = LshParams::builder()
//!     .dimension(16)
//!     .family(LshFamily::Hyperplane)
//!     .distance_function(DistanceFunction::NegativeInnerProduct)
//!     .k(6)
//!     .l(8)
//!     .seed(42)
//!     .build();
//!
//! let mut table = build_index(&points, &params).unwrap();
//! table.set_num_probes(32).unwrap();
//!
//! let nearest = table.find_k_nearest(&points[3], 5).unwrap();
//! assert!(nearest.len() <= 5);
//! println!("closest: {:?}", table.find_closest(&points[3]).unwrap());
//! ```
//!
//! ## Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Parallel hashing during construction and batch queries  |
//! | `serde`    | Serialize/deserialize parameters and statistics         |
//! | `full`     | Enables `parallel` + `serde`                            |

pub mod distance;
pub mod error;
pub mod hash;
pub mod index;
pub mod metrics;
pub mod nn_query;
pub mod params;
pub mod point;
pub mod storage;
pub mod table;
pub mod tuning;

// Re-exports for convenience.
pub use distance::{DistanceFn, NegativeInnerProduct};
pub use error::{LshError, Result, SetupError, TableError};
pub use hash::{CrossPolytopeHash, HyperplaneHash, LshFunction};
pub use index::{build_index, LshNearestNeighborTable};
pub use metrics::QueryStatistics;
pub use params::{DistanceFunction, LshFamily, LshParams, LshParamsBuilder};
pub use point::{DenseVector, PointType, Representation, SparseVector};
pub use storage::{ArrayDataStorage, DataStorage};
pub use table::TableStats;
pub use tuning::{compute_number_of_hash_functions, default_parameters, estimate_hyperplane_recall};
