//! Point representations and the per-representation bindings of distance
//! function and hash families.

use ndarray::Array1;

use crate::distance::{DistanceFn, NegativeInnerProduct};
use crate::error::{SetupError, TableError};
use crate::hash::{CrossPolytopeHash, HyperplaneHash, LshFunction};
use crate::params::LshParams;

/// A dense point: every coordinate is stored.
pub type DenseVector = Array1<f32>;

/// A sparse point: `(index, value)` pairs with strictly ascending indices.
pub type SparseVector = Vec<(u32, f32)>;

/// Closed set of supported point shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Dense,
    Sparse,
}

/// Why a point does not fit the configured dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointDefect {
    DimensionMismatch { expected: usize, got: usize },
    IndexOutOfRange { index: u32, dimension: usize },
    Unsorted,
}

impl PointDefect {
    pub(crate) fn into_setup_error(self, key: usize) -> SetupError {
        match self {
            PointDefect::DimensionMismatch { expected, got } => {
                SetupError::PointDimensionMismatch { key, expected, got }
            }
            PointDefect::IndexOutOfRange { index, dimension } => {
                SetupError::SparseIndexOutOfRange {
                    key,
                    index,
                    dimension,
                }
            }
            PointDefect::Unsorted => SetupError::UnsortedSparsePoint { key },
        }
    }
}

impl From<PointDefect> for TableError {
    fn from(defect: PointDefect) -> Self {
        match defect {
            PointDefect::DimensionMismatch { expected, got } => {
                TableError::QueryDimensionMismatch { expected, got }
            }
            PointDefect::IndexOutOfRange { index, dimension } => {
                TableError::QuerySparseIndexOutOfRange { index, dimension }
            }
            PointDefect::Unsorted => TableError::UnsortedSparseQuery,
        }
    }
}

/// Binds a point representation to its distance function and hash families.
///
/// Resolved once when a table is built; queries run fully monomorphized.
pub trait PointType: Sized + Send + Sync {
    const REPRESENTATION: Representation;

    type Distance: DistanceFn<Self> + Default;
    type Hyperplane: LshFunction<Self>;
    type CrossPolytope: LshFunction<Self>;

    /// Check that the point is well formed for `dimension`.
    fn check(&self, dimension: usize) -> std::result::Result<(), PointDefect>;

    fn hyperplane_hash(
        params: &LshParams,
        seed: u64,
    ) -> std::result::Result<Self::Hyperplane, SetupError>;

    fn cross_polytope_hash(
        params: &LshParams,
        seed: u64,
    ) -> std::result::Result<Self::CrossPolytope, SetupError>;
}

impl PointType for DenseVector {
    const REPRESENTATION: Representation = Representation::Dense;

    type Distance = NegativeInnerProduct;
    type Hyperplane = HyperplaneHash;
    type CrossPolytope = CrossPolytopeHash;

    fn check(&self, dimension: usize) -> std::result::Result<(), PointDefect> {
        if self.len() != dimension {
            return Err(PointDefect::DimensionMismatch {
                expected: dimension,
                got: self.len(),
            });
        }
        Ok(())
    }

    fn hyperplane_hash(
        params: &LshParams,
        seed: u64,
    ) -> std::result::Result<HyperplaneHash, SetupError> {
        Ok(HyperplaneHash::new(
            params.dimension as usize,
            params.k as usize,
            params.l as usize,
            seed,
        ))
    }

    fn cross_polytope_hash(
        params: &LshParams,
        seed: u64,
    ) -> std::result::Result<CrossPolytopeHash, SetupError> {
        CrossPolytopeHash::new_dense(
            params.dimension as usize,
            params.k as usize,
            params.l as usize,
            params.num_rotations as usize,
            params.last_cp_dimension as usize,
            seed,
        )
    }
}

impl PointType for SparseVector {
    const REPRESENTATION: Representation = Representation::Sparse;

    type Distance = NegativeInnerProduct;
    type Hyperplane = HyperplaneHash;
    type CrossPolytope = CrossPolytopeHash;

    fn check(&self, dimension: usize) -> std::result::Result<(), PointDefect> {
        let mut prev: Option<u32> = None;
        for &(index, _) in self {
            if index as usize >= dimension {
                return Err(PointDefect::IndexOutOfRange { index, dimension });
            }
            if prev.is_some_and(|p| p >= index) {
                return Err(PointDefect::Unsorted);
            }
            prev = Some(index);
        }
        Ok(())
    }

    fn hyperplane_hash(
        params: &LshParams,
        seed: u64,
    ) -> std::result::Result<HyperplaneHash, SetupError> {
        Ok(HyperplaneHash::new(
            params.dimension as usize,
            params.k as usize,
            params.l as usize,
            seed,
        ))
    }

    fn cross_polytope_hash(
        params: &LshParams,
        seed: u64,
    ) -> std::result::Result<CrossPolytopeHash, SetupError> {
        if params.feature_hashing_dimension < 1 {
            return Err(SetupError::MissingFeatureHashingDimension(
                params.feature_hashing_dimension,
            ));
        }
        CrossPolytopeHash::new_sparse(
            params.k as usize,
            params.l as usize,
            params.num_rotations as usize,
            params.feature_hashing_dimension as usize,
            params.last_cp_dimension as usize,
            seed,
        )
    }
}
