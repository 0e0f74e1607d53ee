use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::probe::{compose, Alteration, ProbeSequence, TableProbes};
use super::{HashCode, LshFunction};
use crate::error::SetupError;
use crate::point::{DenseVector, SparseVector};

/// Cross-polytope hash for `l` tables of `k` primitive hashes each.
///
/// A primitive hash pads the point to `rotation_dim` (the next power of two),
/// applies `num_rotations` pseudo-random rotations (random ±1 diagonal
/// followed by a fast Hadamard transform) and returns the closest signed
/// basis vector. The last primitive hash of every table only looks at the
/// first `last_cp_dimension` rotated coordinates, which lets the total number
/// of bits per table be tuned finely.
///
/// Sparse points are first feature-hashed (one independent feature hash per
/// table) into `feature_hashing_dimension` coordinates.
#[derive(Debug, Clone)]
pub struct CrossPolytopeHash {
    input_dim: usize,
    rotation_dim: usize,
    k: usize,
    l: usize,
    num_rotations: usize,
    last_cp_dimension: usize,
    diagonals: Array2<f32>,
    feature_seed: Option<u64>,
}

impl CrossPolytopeHash {
    pub fn new_dense(
        dimension: usize,
        k: usize,
        l: usize,
        num_rotations: usize,
        last_cp_dimension: usize,
        seed: u64,
    ) -> Result<Self, SetupError> {
        Self::new(dimension, k, l, num_rotations, last_cp_dimension, seed, None)
    }

    pub fn new_sparse(
        k: usize,
        l: usize,
        num_rotations: usize,
        feature_hashing_dimension: usize,
        last_cp_dimension: usize,
        seed: u64,
    ) -> Result<Self, SetupError> {
        Self::new(
            feature_hashing_dimension,
            k,
            l,
            num_rotations,
            last_cp_dimension,
            seed,
            Some(seed.rotate_left(17) ^ 0x5bd1_e995),
        )
    }

    fn new(
        input_dim: usize,
        k: usize,
        l: usize,
        num_rotations: usize,
        last_cp_dimension: usize,
        seed: u64,
        feature_seed: Option<u64>,
    ) -> Result<Self, SetupError> {
        let rotation_dim = input_dim.max(1).next_power_of_two();
        if last_cp_dimension < 1 {
            return Err(SetupError::InvalidLastCpDimension(last_cp_dimension as i32));
        }
        if last_cp_dimension > rotation_dim {
            return Err(SetupError::LastCpDimensionTooLarge {
                last_cp_dimension,
                rotation_dimension: rotation_dim,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let diagonals = Array2::from_shape_simple_fn((l * k * num_rotations, rotation_dim), || {
            if rng.gen::<bool>() {
                1.0
            } else {
                -1.0
            }
        });

        Ok(Self {
            input_dim,
            rotation_dim,
            k,
            l,
            num_rotations,
            last_cp_dimension,
            diagonals,
            feature_seed,
        })
    }

    pub fn rotation_dim(&self) -> usize {
        self.rotation_dim
    }

    pub fn last_cp_dimension(&self) -> usize {
        self.last_cp_dimension
    }

    fn radices(&self) -> Vec<u32> {
        let mut radices = vec![2 * self.rotation_dim as u32; self.k];
        if let Some(last) = radices.last_mut() {
            *last = 2 * self.last_cp_dimension as u32;
        }
        radices
    }

    fn dense_input(&self, point: &DenseVector) -> Vec<f32> {
        let mut input = vec![0.0f32; self.rotation_dim];
        for (dst, &src) in input.iter_mut().zip(point.iter()) {
            *dst = src;
        }
        input
    }

    fn sparse_input(&self, point: &SparseVector, table: usize, feature_seed: u64) -> Vec<f32> {
        let mut input = vec![0.0f32; self.rotation_dim];
        for &(index, value) in point {
            let h = mix64(feature_seed ^ mix64(((table as u64) << 32) | u64::from(index)));
            let bucket = (h % self.input_dim as u64) as usize;
            if h >> 63 == 0 {
                input[bucket] += value;
            } else {
                input[bucket] -= value;
            }
        }
        input
    }

    /// Rotated coordinates of every primitive hash of `table`, each truncated
    /// to the dimension of its cross-polytope.
    fn blocks(&self, input: &[f32], table: usize) -> Vec<Vec<f32>> {
        (0..self.k)
            .map(|j| {
                let mut x = input.to_vec();
                let base = (table * self.k + j) * self.num_rotations;
                for r in 0..self.num_rotations {
                    for (xi, &s) in x.iter_mut().zip(self.diagonals.row(base + r)) {
                        *xi *= s;
                    }
                    fast_hadamard_transform(&mut x);
                }
                if j + 1 == self.k {
                    x.truncate(self.last_cp_dimension);
                }
                x
            })
            .collect()
    }

    fn table_code(&self, input: &[f32], table: usize, radices: &[u32]) -> HashCode {
        let digits: Vec<u32> = self
            .blocks(input, table)
            .iter()
            .map(|b| closest_vertex(b).0)
            .collect();
        compose(&digits, radices)
    }

    fn table_probes(&self, input: &[f32], table: usize) -> TableProbes {
        let blocks = self.blocks(input, table);
        let mut digits = Vec::with_capacity(self.k);
        let mut alterations = Vec::new();
        for (block, x) in blocks.iter().enumerate() {
            let (best, best_score) = closest_vertex(x);
            digits.push(best);
            let d = x.len() as u32;
            for (i, &xi) in x.iter().enumerate() {
                let i = i as u32;
                for (vertex, score) in [(i, xi), (i + d, -xi)] {
                    if vertex != best {
                        alterations.push(Alteration {
                            cost: best_score - score,
                            block,
                            digit: vertex,
                        });
                    }
                }
            }
        }
        TableProbes::new(digits, alterations)
    }
}

/// Index of the closest signed basis vector and its score.
///
/// Vertex `i` is `+e_i`, vertex `i + d` is `-e_i`. Ties go to the lowest
/// coordinate.
fn closest_vertex(x: &[f32]) -> (u32, f32) {
    let mut best = 0usize;
    let mut best_abs = f32::NEG_INFINITY;
    for (i, &xi) in x.iter().enumerate() {
        if xi.abs() > best_abs {
            best = i;
            best_abs = xi.abs();
        }
    }
    match x.get(best) {
        Some(&v) if v < 0.0 => ((best + x.len()) as u32, best_abs),
        _ => (best as u32, best_abs.max(0.0)),
    }
}

/// Unnormalized in-place Walsh-Hadamard transform. `x.len()` must be a power
/// of two.
pub(crate) fn fast_hadamard_transform(x: &mut [f32]) {
    let n = x.len();
    let mut h = 1;
    while h < n {
        for start in (0..n).step_by(2 * h) {
            for j in start..start + h {
                let a = x[j];
                let b = x[j + h];
                x[j] = a + b;
                x[j + h] = a - b;
            }
        }
        h *= 2;
    }
}

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Split a budget of `number_of_hash_bits` into cross-polytope hashes over a
/// `dimension`-dimensional space.
///
/// Each full cross-polytope contributes `log2(rotation_dim) + 1` bits; a
/// remainder is covered by a smaller last cross-polytope. Returns
/// `(k, last_cp_dimension)`.
pub fn compute_k_parameters_for_bits(dimension: usize, number_of_hash_bits: usize) -> (usize, usize) {
    let rotation_dim = dimension.max(1).next_power_of_two();
    let bits_per_cp = rotation_dim.trailing_zeros() as usize + 1;
    let mut k = number_of_hash_bits / bits_per_cp;
    let remaining = number_of_hash_bits % bits_per_cp;
    if remaining > 0 {
        k += 1;
        (k, 1 << (remaining - 1))
    } else {
        (k, rotation_dim)
    }
}

impl LshFunction<DenseVector> for CrossPolytopeHash {
    fn k(&self) -> usize {
        self.k
    }

    fn l(&self) -> usize {
        self.l
    }

    fn hash(&self, point: &DenseVector) -> Vec<HashCode> {
        let input = self.dense_input(point);
        let radices = self.radices();
        (0..self.l)
            .map(|t| self.table_code(&input, t, &radices))
            .collect()
    }

    fn probes(&self, point: &DenseVector) -> ProbeSequence {
        let input = self.dense_input(point);
        let tables = (0..self.l).map(|t| self.table_probes(&input, t)).collect();
        ProbeSequence::new(self.radices(), tables)
    }
}

impl LshFunction<SparseVector> for CrossPolytopeHash {
    fn k(&self) -> usize {
        self.k
    }

    fn l(&self) -> usize {
        self.l
    }

    fn hash(&self, point: &SparseVector) -> Vec<HashCode> {
        let feature_seed = self.feature_seed.unwrap_or_default();
        let radices = self.radices();
        (0..self.l)
            .map(|t| {
                let input = self.sparse_input(point, t, feature_seed);
                self.table_code(&input, t, &radices)
            })
            .collect()
    }

    fn probes(&self, point: &SparseVector) -> ProbeSequence {
        let feature_seed = self.feature_seed.unwrap_or_default();
        let tables = (0..self.l)
            .map(|t| {
                let input = self.sparse_input(point, t, feature_seed);
                self.table_probes(&input, t)
            })
            .collect();
        ProbeSequence::new(self.radices(), tables)
    }
}
