/// Hash family used to build the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LshFamily {
    /// Not set. Rejected at construction.
    #[default]
    Unknown,
    /// Random hyperplanes (SimHash): one sign bit per hash function.
    Hyperplane,
    /// Pseudo-random rotations followed by the closest signed basis vector.
    CrossPolytope,
}

/// Distance used to rank candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceFunction {
    /// Not set. Rejected at construction.
    #[default]
    Unknown,
    /// `-<p, q>`. On unit vectors this ranks like cosine distance.
    NegativeInnerProduct,
    /// Reserved; rejected at construction for now.
    EuclideanSquared,
}

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 409_556_018;

/// Construction parameters for an LSH table.
///
/// Integer fields are signed so that "unset" (`-1`) and invalid values can be
/// expressed and are reported by [`crate::build_index`] instead of being
/// silently defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LshParams {
    /// Dimension of the points. For sparse points this bounds the indices.
    pub dimension: i32,
    pub lsh_family: LshFamily,
    pub distance_function: DistanceFunction,
    /// Hash functions per table.
    pub k: i32,
    /// Number of tables.
    pub l: i32,
    /// Pseudo-random rotations per cross-polytope hash.
    pub num_rotations: i32,
    /// Dimension of the last cross-polytope in each table.
    pub last_cp_dimension: i32,
    /// Sparse cross-polytope only: points are hashed into this many
    /// coordinates before rotating.
    pub feature_hashing_dimension: i32,
    pub seed: u64,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            dimension: -1,
            lsh_family: LshFamily::Unknown,
            distance_function: DistanceFunction::Unknown,
            k: -1,
            l: -1,
            num_rotations: -1,
            last_cp_dimension: -1,
            feature_hashing_dimension: -1,
            seed: DEFAULT_SEED,
        }
    }
}

impl LshParams {
    pub fn builder() -> LshParamsBuilder {
        LshParamsBuilder::new()
    }
}

/// Fluent builder for [`LshParams`].
///
/// Performs no validation; that happens when the table is built.
#[derive(Debug, Default)]
pub struct LshParamsBuilder {
    params: LshParams,
}

impl LshParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimension(mut self, dimension: i32) -> Self {
        self.params.dimension = dimension;
        self
    }

    pub fn family(mut self, family: LshFamily) -> Self {
        self.params.lsh_family = family;
        self
    }

    pub fn distance_function(mut self, distance: DistanceFunction) -> Self {
        self.params.distance_function = distance;
        self
    }

    pub fn k(mut self, k: i32) -> Self {
        self.params.k = k;
        self
    }

    pub fn l(mut self, l: i32) -> Self {
        self.params.l = l;
        self
    }

    pub fn num_rotations(mut self, n: i32) -> Self {
        self.params.num_rotations = n;
        self
    }

    pub fn last_cp_dimension(mut self, d: i32) -> Self {
        self.params.last_cp_dimension = d;
        self
    }

    pub fn feature_hashing_dimension(mut self, d: i32) -> Self {
        self.params.feature_hashing_dimension = d;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    pub fn build(self) -> LshParams {
        self.params
    }
}
