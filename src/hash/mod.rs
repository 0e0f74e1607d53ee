//! LSH families that map a point to one code per table.

mod cross_polytope;
mod hyperplane;
mod probe;

pub use cross_polytope::{compute_k_parameters_for_bits, CrossPolytopeHash};
pub use hyperplane::HyperplaneHash;
pub use probe::{Alteration, ProbeSequence, TableProbes};

/// Hash code stored in the tables. Fixed width: large `k` wraps.
pub type HashCode = u32;

/// A family of `l` composite hash functions, each built from `k` primitive
/// hashes.
pub trait LshFunction<P: ?Sized>: Send + Sync {
    /// Primitive hash functions per table.
    fn k(&self) -> usize;

    /// Number of tables.
    fn l(&self) -> usize;

    /// One code per table, in table order.
    fn hash(&self, point: &P) -> Vec<HashCode>;

    /// Multiprobe sequence over all tables, most likely buckets first.
    ///
    /// The first `l` items are the exact buckets of every table, in table
    /// order.
    fn probes(&self, point: &P) -> ProbeSequence;
}
