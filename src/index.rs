use tracing::{debug, info, trace};

use crate::error::{SetupError, TableError};
use crate::hash::LshFunction;
use crate::metrics::{QueryStatistics, QueryTimer};
use crate::nn_query::NearestNeighborQuery;
use crate::params::{DistanceFunction, LshFamily, LshParams};
use crate::point::PointType;
use crate::storage::ArrayDataStorage;
use crate::table::{BucketTableFactory, CompositeHashTable, StaticLshTable, TableStats};

/// Mixed into the configured seed before it reaches the hash function, so
/// other uses of the same seed draw independent randomness.
const HASH_SEED_SALT: u64 = 93_384_688;

/// Bucket-table capacity per point.
const TABLE_LOAD_FACTOR: usize = 2;

/// Query surface of a built LSH table.
///
/// All query methods take `&self` and may run concurrently from several
/// threads. Knob setters take `&mut self`, so changing the search effort
/// while queries are in flight is ruled out by the borrow checker. Queries
/// only fail when the query point itself is malformed; an empty result is a
/// valid outcome.
///
/// Every result is approximate: only the buckets selected by the multiprobe
/// sequence are examined, so recall depends on the number of probes and the
/// candidate cap.
pub trait LshNearestNeighborTable<P>: Send + Sync {
    /// Set the number of `(table, bucket)` probes per query. Must be at
    /// least 1. Defaults to `l`, i.e. the exact bucket of every table.
    fn set_num_probes(&mut self, num_probes: i64) -> Result<(), TableError>;

    fn num_probes(&self) -> usize;

    /// Cap the number of candidates examined per query. `None` removes the
    /// cap, which is the default.
    ///
    /// The cap counts raw candidates in probe order, duplicates included, not
    /// distinct keys: a key found in several tables uses up several slots, so
    /// fewer than `max_num_candidates` distinct keys may come back.
    fn set_max_num_candidates(&mut self, max_num_candidates: Option<usize>);

    fn max_num_candidates(&self) -> Option<usize>;

    /// Closest candidate by true distance. `Ok(None)` when the probed buckets
    /// are empty.
    fn find_closest(&self, q: &P) -> Result<Option<usize>, TableError>;

    /// Up to `k` candidates in non-decreasing distance. Ties keep the order in
    /// which candidates were discovered.
    fn find_k_nearest(&self, q: &P, k: usize) -> Result<Vec<usize>, TableError>;

    /// Candidates within distance `threshold` of `q`.
    fn find_near(&self, q: &P, threshold: f32) -> Result<Vec<usize>, TableError>;

    /// Every key in the probed buckets, in probe order, duplicates retained.
    fn candidates_with_duplicates(&self, q: &P) -> Result<Vec<usize>, TableError>;

    /// Distinct keys in the probed buckets. Order is unspecified.
    fn unique_candidates(&self, q: &P) -> Result<Vec<usize>, TableError>;

    /// Distinct keys in the probed buckets, ascending by key.
    fn unique_sorted_candidates(&self, q: &P) -> Result<Vec<usize>, TableError>;

    /// Clear the nearest-neighbor query counters.
    fn reset_statistics(&self);

    /// Averages over the `find_*` queries since the last reset.
    fn statistics(&self) -> QueryStatistics;

    /// Number of indexed points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parameters the table was built with.
    fn params(&self) -> &LshParams;

    fn table_stats(&self) -> TableStats;
}

/// Build an LSH table over `points`. Keys are positions in the slice.
///
/// The slice is borrowed for the lifetime of the table; nothing is copied.
/// Every point is hashed once (`n * l` codes). On error nothing is built.
pub fn build_index<'a, P>(
    points: &'a [P],
    params: &LshParams,
) -> Result<Box<dyn LshNearestNeighborTable<P> + 'a>, SetupError>
where
    P: PointType + 'a,
{
    let timer = QueryTimer::new();
    validate_params(params)?;

    let dimension = params.dimension as usize;
    for (key, point) in points.iter().enumerate() {
        point
            .check(dimension)
            .map_err(|defect| defect.into_setup_error(key))?;
    }

    let seed = params.seed ^ HASH_SEED_SALT;
    let table: Box<dyn LshNearestNeighborTable<P> + 'a> = match params.lsh_family {
        LshFamily::Hyperplane => {
            debug!(dimension, k = params.k, l = params.l, "constructing hyperplane hash");
            let hash = P::hyperplane_hash(params, seed)?;
            Box::new(LshTable::<P, P::Hyperplane, P::Distance>::assemble(points, params, hash))
        }
        LshFamily::CrossPolytope => {
            debug!(
                dimension,
                k = params.k,
                l = params.l,
                num_rotations = params.num_rotations,
                last_cp_dimension = params.last_cp_dimension,
                "constructing cross-polytope hash"
            );
            let hash = P::cross_polytope_hash(params, seed)?;
            Box::new(LshTable::<P, P::CrossPolytope, P::Distance>::assemble(points, params, hash))
        }
        LshFamily::Unknown => return Err(SetupError::UnknownHashFamily),
    };

    info!(
        points = points.len(),
        family = ?params.lsh_family,
        k = params.k,
        l = params.l,
        elapsed_us = timer.elapsed_ns() / 1000,
        "built LSH table"
    );
    Ok(table)
}

fn validate_params(params: &LshParams) -> Result<(), SetupError> {
    if params.dimension < 1 {
        return Err(SetupError::InvalidDimension(params.dimension));
    }
    if params.k < 1 {
        return Err(SetupError::InvalidK(params.k));
    }
    if params.l < 1 {
        return Err(SetupError::InvalidL(params.l));
    }
    if params.distance_function != DistanceFunction::NegativeInnerProduct {
        return Err(SetupError::UnsupportedDistanceFunction(
            params.distance_function,
        ));
    }
    match params.lsh_family {
        LshFamily::Hyperplane => Ok(()),
        LshFamily::CrossPolytope => {
            if params.num_rotations < 0 {
                return Err(SetupError::NegativeRotations(params.num_rotations));
            }
            if params.last_cp_dimension <= 0 {
                return Err(SetupError::InvalidLastCpDimension(
                    params.last_cp_dimension,
                ));
            }
            Ok(())
        }
        LshFamily::Unknown => Err(SetupError::UnknownHashFamily),
    }
}

/// The concrete table behind [`build_index`].
///
/// Owns every component. Fields are declared in reverse construction order
/// so they are dropped in reverse too.
struct LshTable<'a, P, H, D> {
    nn_query: NearestNeighborQuery<D>,
    lsh_table: StaticLshTable<P, H>,
    hash_table_factory: BucketTableFactory,
    data_storage: ArrayDataStorage<'a, P>,
    params: LshParams,
    num_probes: usize,
    max_num_candidates: Option<usize>,
}

impl<'a, P, H, D> LshTable<'a, P, H, D>
where
    P: PointType,
    H: LshFunction<P>,
    D: Default,
{
    fn assemble(points: &'a [P], params: &LshParams, hash: H) -> Self {
        let data_storage = ArrayDataStorage::new(points);
        let hash_table_factory = BucketTableFactory::new(TABLE_LOAD_FACTOR * points.len());
        let composite = CompositeHashTable::new(hash.l(), &hash_table_factory);

        debug!(points = points.len(), l = hash.l(), "populating hash tables");
        let lsh_table = StaticLshTable::build(hash, composite, &data_storage);
        let nn_query = NearestNeighborQuery::new(D::default());
        let num_probes = lsh_table.hash_function().l();

        Self {
            nn_query,
            lsh_table,
            hash_table_factory,
            data_storage,
            params: params.clone(),
            num_probes,
            max_num_candidates: None,
        }
    }

    fn check_query(&self, q: &P) -> Result<(), TableError> {
        q.check(self.params.dimension as usize)?;
        Ok(())
    }
}

impl<P, H, D> LshNearestNeighborTable<P> for LshTable<'_, P, H, D>
where
    P: PointType,
    H: LshFunction<P>,
    D: crate::distance::DistanceFn<P> + Default,
{
    fn set_num_probes(&mut self, num_probes: i64) -> Result<(), TableError> {
        if num_probes <= 0 {
            return Err(TableError::InvalidNumProbes(num_probes));
        }
        self.num_probes = usize::try_from(num_probes).unwrap_or(usize::MAX);
        trace!(num_probes = self.num_probes, "set number of probes");
        Ok(())
    }

    fn num_probes(&self) -> usize {
        self.num_probes
    }

    fn set_max_num_candidates(&mut self, max_num_candidates: Option<usize>) {
        self.max_num_candidates = max_num_candidates;
        trace!(?max_num_candidates, "set maximum number of candidates");
    }

    fn max_num_candidates(&self) -> Option<usize> {
        self.max_num_candidates
    }

    fn find_closest(&self, q: &P) -> Result<Option<usize>, TableError> {
        self.check_query(q)?;
        Ok(self.nn_query.find_closest(
            &self.lsh_table.query(),
            &self.data_storage,
            q,
            self.num_probes,
            self.max_num_candidates,
        ))
    }

    fn find_k_nearest(&self, q: &P, k: usize) -> Result<Vec<usize>, TableError> {
        self.check_query(q)?;
        Ok(self.nn_query.find_k_nearest(
            &self.lsh_table.query(),
            &self.data_storage,
            q,
            k,
            self.num_probes,
            self.max_num_candidates,
        ))
    }

    fn find_near(&self, q: &P, threshold: f32) -> Result<Vec<usize>, TableError> {
        self.check_query(q)?;
        Ok(self.nn_query.find_near(
            &self.lsh_table.query(),
            &self.data_storage,
            q,
            threshold,
            self.num_probes,
            self.max_num_candidates,
        ))
    }

    fn candidates_with_duplicates(&self, q: &P) -> Result<Vec<usize>, TableError> {
        self.check_query(q)?;
        Ok(self.lsh_table.query().candidates_with_duplicates(
            q,
            self.num_probes,
            self.max_num_candidates,
        ))
    }

    fn unique_candidates(&self, q: &P) -> Result<Vec<usize>, TableError> {
        self.check_query(q)?;
        Ok(self.lsh_table.query().unique_candidates(
            q,
            self.num_probes,
            self.max_num_candidates,
        ))
    }

    fn unique_sorted_candidates(&self, q: &P) -> Result<Vec<usize>, TableError> {
        self.check_query(q)?;
        Ok(self.lsh_table.query().unique_sorted_candidates(
            q,
            self.num_probes,
            self.max_num_candidates,
        ))
    }

    fn reset_statistics(&self) {
        self.nn_query.reset_statistics();
        trace!("reset query statistics");
    }

    fn statistics(&self) -> QueryStatistics {
        self.nn_query.statistics()
    }

    fn len(&self) -> usize {
        self.data_storage.points().len()
    }

    fn params(&self) -> &LshParams {
        &self.params
    }

    fn table_stats(&self) -> TableStats {
        TableStats::collect(
            self.lsh_table.composite_table(),
            self.lsh_table.num_points(),
            self.hash_table_factory.expected_size(),
        )
    }
}

#[cfg(feature = "parallel")]
impl<P: Sync> dyn LshNearestNeighborTable<P> + '_ {
    /// Run [`LshNearestNeighborTable::find_k_nearest`] for many queries in
    /// parallel. Results are in query order.
    pub fn par_find_k_nearest_batch(
        &self,
        queries: &[P],
        k: usize,
    ) -> Result<Vec<Vec<usize>>, TableError> {
        use rayon::prelude::*;

        queries
            .par_iter()
            .map(|q| self.find_k_nearest(q, k))
            .collect()
    }
}
