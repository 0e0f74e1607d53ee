use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::probe::{Alteration, ProbeSequence, TableProbes};
use super::{HashCode, LshFunction};
use crate::point::{DenseVector, SparseVector};

/// Random-hyperplane hash (SimHash) for `l` tables of `k` bits each.
///
/// Bit `j` of table `t` is the sign of the dot product with Gaussian
/// hyperplane `t * k + j`. The first hyperplane of a table is the most
/// significant bit of its code.
#[derive(Debug, Clone)]
pub struct HyperplaneHash {
    planes: Array2<f32>,
    k: usize,
    l: usize,
}

impl HyperplaneHash {
    /// Draw `k * l` hyperplanes of dimension `dim` from a generator seeded
    /// with `seed`.
    pub fn new(dim: usize, k: usize, l: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let planes = Array2::from_shape_simple_fn((k * l, dim), || rng.sample(StandardNormal));
        Self { planes, k, l }
    }

    pub fn dimension(&self) -> usize {
        self.planes.ncols()
    }

    fn project_sparse(&self, point: &SparseVector) -> Array1<f32> {
        let mut projections = Array1::<f32>::zeros(self.planes.nrows());
        for &(index, value) in point {
            projections.scaled_add(value, &self.planes.column(index as usize));
        }
        projections
    }

    fn codes(&self, projections: &Array1<f32>) -> Vec<HashCode> {
        projections
            .as_slice()
            .unwrap_or(&[])
            .chunks(self.k)
            .map(|bits| {
                bits.iter()
                    .fold(0u32, |code, &p| (code << 1) | u32::from(p >= 0.0))
            })
            .collect()
    }

    fn probe_sequence(&self, projections: &Array1<f32>) -> ProbeSequence {
        let tables = projections
            .as_slice()
            .unwrap_or(&[])
            .chunks(self.k)
            .map(|bits| {
                let digits: Vec<u32> = bits.iter().map(|&p| u32::from(p >= 0.0)).collect();
                let alterations = bits
                    .iter()
                    .zip(&digits)
                    .enumerate()
                    .map(|(block, (&p, &d))| Alteration {
                        cost: p.abs(),
                        block,
                        digit: 1 - d,
                    })
                    .collect();
                TableProbes::new(digits, alterations)
            })
            .collect();
        ProbeSequence::new(vec![2; self.k], tables)
    }
}

impl LshFunction<DenseVector> for HyperplaneHash {
    fn k(&self) -> usize {
        self.k
    }

    fn l(&self) -> usize {
        self.l
    }

    fn hash(&self, point: &DenseVector) -> Vec<HashCode> {
        self.codes(&self.planes.dot(point))
    }

    fn probes(&self, point: &DenseVector) -> ProbeSequence {
        self.probe_sequence(&self.planes.dot(point))
    }
}

impl LshFunction<SparseVector> for HyperplaneHash {
    fn k(&self) -> usize {
        self.k
    }

    fn l(&self) -> usize {
        self.l
    }

    fn hash(&self, point: &SparseVector) -> Vec<HashCode> {
        self.codes(&self.project_sparse(point))
    }

    fn probes(&self, point: &SparseVector) -> ProbeSequence {
        self.probe_sequence(&self.project_sparse(point))
    }
}
