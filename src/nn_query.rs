use std::time::Instant;

use crate::distance::DistanceFn;
use crate::hash::LshFunction;
use crate::metrics::{QueryStatistics, QueryTimer, StatisticsCollector};
use crate::storage::DataStorage;
use crate::table::LshQuery;

/// Ranks candidates from an [`LshQuery`] by true distance.
#[derive(Debug, Default)]
pub struct NearestNeighborQuery<D> {
    distance: D,
    stats: StatisticsCollector,
}

impl<D> NearestNeighborQuery<D> {
    pub fn new(distance: D) -> Self {
        Self {
            distance,
            stats: StatisticsCollector::new(),
        }
    }

    pub fn statistics(&self) -> QueryStatistics {
        self.stats.snapshot()
    }

    pub fn reset_statistics(&self) {
        self.stats.reset();
    }

    /// Distinct candidates with their distances, in discovery order.
    fn scored_candidates<P, H, S>(
        &self,
        query: &LshQuery<'_, P, H>,
        storage: &S,
        q: &P,
        num_probes: usize,
        max_num_candidates: Option<usize>,
    ) -> Vec<(usize, f32)>
    where
        P: Sync,
        H: LshFunction<P>,
        S: DataStorage<P>,
        D: DistanceFn<P>,
    {
        let timer = QueryTimer::new();
        let (keys, candidates) =
            query.unique_candidates_with_stats(q, num_probes, max_num_candidates);

        let distance_start = Instant::now();
        let scored: Vec<(usize, f32)> = keys
            .iter()
            .filter_map(|&key| {
                storage
                    .get(key)
                    .map(|p| (key, self.distance.distance(q, p)))
            })
            .collect();
        let distance_time_ns = distance_start.elapsed().as_nanos() as u64;

        self.stats.record_query(
            &candidates,
            keys.len() as u64,
            distance_time_ns,
            timer.elapsed_ns(),
        );
        scored
    }

    /// Closest candidate, or `None` when the probes found nothing.
    ///
    /// Ties go to the candidate discovered first.
    pub fn find_closest<P, H, S>(
        &self,
        query: &LshQuery<'_, P, H>,
        storage: &S,
        q: &P,
        num_probes: usize,
        max_num_candidates: Option<usize>,
    ) -> Option<usize>
    where
        P: Sync,
        H: LshFunction<P>,
        S: DataStorage<P>,
        D: DistanceFn<P>,
    {
        self.scored_candidates(query, storage, q, num_probes, max_num_candidates)
            .into_iter()
            .fold(None, |best: Option<(usize, f32)>, (key, dist)| match best {
                Some((_, best_dist)) if best_dist <= dist => best,
                _ => Some((key, dist)),
            })
            .map(|(key, _)| key)
    }

    /// Up to `k` candidates by ascending distance; ties keep discovery order.
    pub fn find_k_nearest<P, H, S>(
        &self,
        query: &LshQuery<'_, P, H>,
        storage: &S,
        q: &P,
        k: usize,
        num_probes: usize,
        max_num_candidates: Option<usize>,
    ) -> Vec<usize>
    where
        P: Sync,
        H: LshFunction<P>,
        S: DataStorage<P>,
        D: DistanceFn<P>,
    {
        let mut scored = self.scored_candidates(query, storage, q, num_probes, max_num_candidates);
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        scored.into_iter().map(|(key, _)| key).collect()
    }

    /// Candidates within `threshold`, in discovery order.
    pub fn find_near<P, H, S>(
        &self,
        query: &LshQuery<'_, P, H>,
        storage: &S,
        q: &P,
        threshold: f32,
        num_probes: usize,
        max_num_candidates: Option<usize>,
    ) -> Vec<usize>
    where
        P: Sync,
        H: LshFunction<P>,
        S: DataStorage<P>,
        D: DistanceFn<P>,
    {
        self.scored_candidates(query, storage, q, num_probes, max_num_candidates)
            .into_iter()
            .filter(|&(_, dist)| dist <= threshold)
            .map(|(key, _)| key)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::NegativeInnerProduct;
    use crate::hash::HyperplaneHash;
    use crate::point::DenseVector;
    use crate::storage::ArrayDataStorage;
    use crate::table::{BucketTableFactory, CompositeHashTable, StaticLshTable};
    use ndarray::array;

    fn setup(points: &[DenseVector]) -> StaticLshTable<DenseVector, HyperplaneHash> {
        let factory = BucketTableFactory::new(2 * points.len());
        // k = 1 bit, 1 table: probing both buckets sees every point.
        let composite = CompositeHashTable::new(1, &factory);
        StaticLshTable::build(
            HyperplaneHash::new(2, 1, 1, 3),
            composite,
            &ArrayDataStorage::new(points),
        )
    }

    fn points() -> Vec<DenseVector> {
        vec![
            array![1.0, 0.0],
            array![0.0, 1.0],
            array![-1.0, 0.0],
            array![0.0, -1.0],
            array![0.8, 0.6],
        ]
    }

    #[test]
    fn test_k_nearest_sorted_by_distance() {
        let points = points();
        let table = setup(&points);
        let storage = ArrayDataStorage::new(&points[..]);
        let nn = NearestNeighborQuery::new(NegativeInnerProduct);
        let q = array![1.0, 0.1];

        let result = nn.find_k_nearest(&table.query(), &storage, &q, 3, 2, None);
        assert_eq!(result, vec![0, 4, 1]);
    }

    #[test]
    fn test_closest_and_near() {
        let points = points();
        let table = setup(&points);
        let storage = ArrayDataStorage::new(&points[..]);
        let nn = NearestNeighborQuery::new(NegativeInnerProduct);
        let q = array![0.0, 2.0];

        assert_eq!(nn.find_closest(&table.query(), &storage, &q, 2, None), Some(1));

        let mut near = nn.find_near(&table.query(), &storage, &q, -1.0, 2, None);
        near.sort_unstable();
        assert_eq!(near, vec![1, 4]);
    }

    #[test]
    fn test_no_candidates_is_none() {
        let points = points();
        let table = setup(&points);
        let storage = ArrayDataStorage::new(&points[..]);
        let nn = NearestNeighborQuery::new(NegativeInnerProduct);
        let q = array![1.0, 0.0];

        assert_eq!(nn.find_closest(&table.query(), &storage, &q, 2, Some(0)), None);
        assert!(nn
            .find_k_nearest(&table.query(), &storage, &q, 5, 2, Some(0))
            .is_empty());
    }

    #[test]
    fn test_records_statistics() {
        let points = points();
        let table = setup(&points);
        let storage = ArrayDataStorage::new(&points[..]);
        let nn = NearestNeighborQuery::new(NegativeInnerProduct);
        let q = array![0.5, 0.5];

        nn.find_k_nearest(&table.query(), &storage, &q, 2, 2, None);
        nn.find_closest(&table.query(), &storage, &q, 2, None);
        let stats = nn.statistics();
        assert_eq!(stats.num_queries, 2);
        assert!((stats.average_num_unique_candidates - 5.0).abs() < 1e-9);

        nn.reset_statistics();
        assert_eq!(nn.statistics().num_queries, 0);
    }
}
