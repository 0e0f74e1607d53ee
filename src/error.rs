use thiserror::Error;

use crate::params::DistanceFunction;

/// Errors raised while building an LSH table.
///
/// Construction is all-or-nothing: when one of these is returned no table
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error(
        "point dimension must be at least 1, got {0}; \
         maybe you forgot to set the dimension in the parameters?"
    )]
    InvalidDimension(i32),

    #[error(
        "number of hash functions k must be at least 1, got {0}; \
         maybe you forgot to set k in the parameters?"
    )]
    InvalidK(i32),

    #[error(
        "number of hash tables l must be at least 1, got {0}; \
         maybe you forgot to set l in the parameters?"
    )]
    InvalidL(i32),

    #[error(
        "unsupported distance function {0:?}; \
         only NegativeInnerProduct is currently supported"
    )]
    UnsupportedDistanceFunction(DistanceFunction),

    #[error("unknown hash family; maybe you forgot to set the family in the parameters?")]
    UnknownHashFamily,

    #[error(
        "number of pseudo-random rotations for the cross-polytope hash must be \
         non-negative, got {0}"
    )]
    NegativeRotations(i32),

    #[error(
        "last cross-polytope dimension must be at least 1, got {0}; \
         maybe you forgot to set last_cp_dimension in the parameters?"
    )]
    InvalidLastCpDimension(i32),

    #[error(
        "last cross-polytope dimension {last_cp_dimension} exceeds the rotation \
         dimension {rotation_dimension}"
    )]
    LastCpDimensionTooLarge {
        last_cp_dimension: usize,
        rotation_dimension: usize,
    },

    #[error(
        "vector dimension must be set to determine the number of dense \
         cross-polytope hash functions"
    )]
    MissingDimension,

    #[error(
        "feature hashing dimension must be set for sparse cross-polytope hashing, got {0}"
    )]
    MissingFeatureHashingDimension(i32),

    #[error("number of hash bits must be at least 1, got {0}")]
    InvalidBitBudget(i32),

    #[error("point {key} has dimension {got}, expected {expected}")]
    PointDimensionMismatch {
        key: usize,
        expected: usize,
        got: usize,
    },

    #[error("point {key} has coordinate index {index} outside dimension {dimension}")]
    SparseIndexOutOfRange {
        key: usize,
        index: u32,
        dimension: usize,
    },

    #[error("sparse point {key} does not have strictly ascending indices")]
    UnsortedSparsePoint { key: usize },
}

/// Errors raised by a built table: invalid knob values or malformed query
/// points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("number of probes must be at least 1, got {0}")]
    InvalidNumProbes(i64),

    #[error("query dimension mismatch: expected {expected}, got {got}")]
    QueryDimensionMismatch { expected: usize, got: usize },

    #[error("query coordinate index {index} outside dimension {dimension}")]
    QuerySparseIndexOutOfRange { index: u32, dimension: usize },

    #[error("sparse query does not have strictly ascending indices")]
    UnsortedSparseQuery,
}

/// Any error produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LshError {
    #[error("setup error: {0}")]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// A specialized Result type for LSH table operations.
pub type Result<T> = std::result::Result<T, LshError>;
