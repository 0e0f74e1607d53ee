use ndarray::Array1;

use crate::point::{DenseVector, SparseVector};

/// A pure distance between two points. Smaller means closer.
pub trait DistanceFn<P: ?Sized>: Send + Sync {
    fn distance(&self, a: &P, b: &P) -> f32;
}

/// Negative inner product: `-<a, b>`.
///
/// On unit-length vectors this orders candidates exactly like cosine
/// distance, which is what both hash families approximate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegativeInnerProduct;

impl DistanceFn<DenseVector> for NegativeInnerProduct {
    #[inline]
    fn distance(&self, a: &DenseVector, b: &DenseVector) -> f32 {
        -a.dot(b)
    }
}

impl DistanceFn<SparseVector> for NegativeInnerProduct {
    #[inline]
    fn distance(&self, a: &SparseVector, b: &SparseVector) -> f32 {
        -sparse_dot(a, b)
    }
}

/// Inner product of two sparse vectors with ascending indices.
pub fn sparse_dot(a: &[(u32, f32)], b: &[(u32, f32)]) -> f32 {
    let mut i = 0;
    let mut j = 0;
    let mut sum = 0.0f32;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    sum
}

/// Normalize a vector to unit length (L2 norm). Leaves zero vectors unchanged.
pub fn normalize(v: &mut Array1<f32>) {
    let norm = v.dot(v).sqrt();
    if norm > f32::EPSILON {
        *v /= norm;
    }
}

/// Sparse counterpart of [`normalize`].
pub fn normalize_sparse(v: &mut SparseVector) {
    let norm = v.iter().map(|&(_, x)| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for (_, x) in v.iter_mut() {
            *x /= norm;
        }
    }
}
