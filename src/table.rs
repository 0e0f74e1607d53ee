//! Static hash tables and the LSH table that ties them to a hash function.

use std::marker::PhantomData;
use std::time::Instant;

use hashbrown::{HashMap, HashSet};

use crate::hash::{HashCode, LshFunction};
use crate::storage::DataStorage;

/// Builds [`StaticBucketTable`]s sized for an expected number of entries.
#[derive(Debug, Clone, Copy)]
pub struct BucketTableFactory {
    expected_size: usize,
}

impl BucketTableFactory {
    pub fn new(expected_size: usize) -> Self {
        Self { expected_size }
    }

    pub fn expected_size(&self) -> usize {
        self.expected_size
    }

    pub fn new_table(&self) -> StaticBucketTable {
        StaticBucketTable {
            buckets: HashMap::with_capacity(self.expected_size),
            keys: Vec::new(),
        }
    }
}

/// A hash table built once from all entries and never modified afterwards.
///
/// Keys of one bucket are stored contiguously in ascending order.
#[derive(Debug, Clone, Default)]
pub struct StaticBucketTable {
    buckets: HashMap<HashCode, (usize, usize)>,
    keys: Vec<usize>,
}

impl StaticBucketTable {
    /// Insert all entries; key `i` goes to bucket `codes[i]`. Replaces any
    /// previous content.
    pub fn add_entries(&mut self, codes: &[HashCode]) {
        let mut order: Vec<usize> = (0..codes.len()).collect();
        order.sort_unstable_by_key(|&key| (codes[key], key));

        self.buckets.clear();
        let mut start = 0;
        while start < order.len() {
            let code = codes[order[start]];
            let mut end = start + 1;
            while end < order.len() && codes[order[end]] == code {
                end += 1;
            }
            self.buckets.insert(code, (start, end - start));
            start = end;
        }
        self.keys = order;
    }

    /// Keys stored under `code`, empty if none.
    #[inline]
    pub fn bucket(&self, code: HashCode) -> &[usize] {
        match self.buckets.get(&code) {
            Some(&(start, len)) => &self.keys[start..start + len],
            None => &[],
        }
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn num_entries(&self) -> usize {
        self.keys.len()
    }
}

/// The `l` per-table hash tables of one index.
#[derive(Debug, Clone)]
pub struct CompositeHashTable {
    tables: Vec<StaticBucketTable>,
}

impl CompositeHashTable {
    pub fn new(l: usize, factory: &BucketTableFactory) -> Self {
        Self {
            tables: (0..l).map(|_| factory.new_table()).collect(),
        }
    }

    pub fn l(&self) -> usize {
        self.tables.len()
    }

    pub fn add_entries_for_table(&mut self, table: usize, codes: &[HashCode]) {
        self.tables[table].add_entries(codes);
    }

    #[inline]
    pub fn bucket(&self, table: usize, code: HashCode) -> &[usize] {
        self.tables[table].bucket(code)
    }

    pub fn tables(&self) -> &[StaticBucketTable] {
        &self.tables
    }
}

/// Bucket shape of a built index.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    pub num_points: usize,
    pub num_tables: usize,
    pub total_buckets: usize,
    pub avg_bucket_size: f64,
    pub max_bucket_size: usize,
    /// Entries each bucket table was sized for.
    pub bucket_capacity: usize,
}

impl TableStats {
    pub fn collect(tables: &CompositeHashTable, num_points: usize, bucket_capacity: usize) -> Self {
        let sizes = tables
            .tables()
            .iter()
            .flat_map(|t| t.buckets.values().map(|&(_, len)| len));
        let (total_buckets, total_entries, max_bucket_size) =
            sizes.fold((0usize, 0usize, 0usize), |(n, sum, max), len| {
                (n + 1, sum + len, max.max(len))
            });
        Self {
            num_points,
            num_tables: tables.l(),
            total_buckets,
            avg_bucket_size: if total_buckets > 0 {
                total_entries as f64 / total_buckets as f64
            } else {
                0.0
            },
            max_bucket_size,
            bucket_capacity,
        }
    }
}

impl std::fmt::Display for TableStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LshTable {{ points: {}, tables: {}, buckets: {}, avg_bucket: {:.1}, max_bucket: {} }}",
            self.num_points,
            self.num_tables,
            self.total_buckets,
            self.avg_bucket_size,
            self.max_bucket_size,
        )
    }
}

/// An LSH function plus the populated composite table it indexes into.
#[derive(Debug)]
pub struct StaticLshTable<P, H> {
    hash: H,
    tables: CompositeHashTable,
    num_points: usize,
    _point: PhantomData<fn(&P)>,
}

impl<P: Sync, H: LshFunction<P>> StaticLshTable<P, H> {
    /// Hash every point in `storage` once and insert its key into each table.
    pub fn build<S: DataStorage<P>>(hash: H, mut tables: CompositeHashTable, storage: &S) -> Self {
        let num_points = storage.len();
        let per_point = hash_all(&hash, storage);

        for table in 0..tables.l() {
            let codes: Vec<HashCode> = per_point.iter().map(|codes| codes[table]).collect();
            tables.add_entries_for_table(table, &codes);
        }

        Self {
            hash,
            tables,
            num_points,
            _point: PhantomData,
        }
    }

    pub fn hash_function(&self) -> &H {
        &self.hash
    }

    pub fn composite_table(&self) -> &CompositeHashTable {
        &self.tables
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Stateless candidate retrieval bound to this table.
    pub fn query(&self) -> LshQuery<'_, P, H> {
        LshQuery { table: self }
    }
}

#[cfg(not(feature = "parallel"))]
fn hash_all<P: Sync, H: LshFunction<P>, S: DataStorage<P>>(hash: &H, storage: &S) -> Vec<Vec<HashCode>> {
    (0..storage.len())
        .filter_map(|key| storage.get(key))
        .map(|p| hash.hash(p))
        .collect()
}

#[cfg(feature = "parallel")]
fn hash_all<P: Sync, H: LshFunction<P>, S: DataStorage<P>>(hash: &H, storage: &S) -> Vec<Vec<HashCode>> {
    use rayon::prelude::*;

    (0..storage.len())
        .into_par_iter()
        .filter_map(|key| storage.get(key))
        .map(|p| hash.hash(p))
        .collect()
}

/// Timing and counts gathered while collecting candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateStats {
    pub lsh_time_ns: u64,
    pub hash_table_time_ns: u64,
    pub num_candidates: u64,
}

/// Candidate retrieval over a [`StaticLshTable`].
///
/// Holds no state of its own; every call walks the multiprobe sequence of the
/// query point from scratch.
#[derive(Debug)]
pub struct LshQuery<'t, P, H> {
    table: &'t StaticLshTable<P, H>,
}

impl<P: Sync, H: LshFunction<P>> LshQuery<'_, P, H> {
    /// Visit candidates of the first `num_probes` probes in probe order,
    /// stopping after `max_num_candidates` keys (duplicates included).
    pub fn for_each_candidate(
        &self,
        q: &P,
        num_probes: usize,
        max_num_candidates: Option<usize>,
        mut visit: impl FnMut(usize),
    ) -> CandidateStats {
        let limit = max_num_candidates.unwrap_or(usize::MAX);
        let start = Instant::now();
        let probes = self.table.hash.probes(q);
        let hashed = Instant::now();

        let mut count = 0usize;
        'probes: for (table, code) in probes.take(num_probes) {
            for &key in self.table.tables.bucket(table, code) {
                if count >= limit {
                    break 'probes;
                }
                visit(key);
                count += 1;
            }
        }

        CandidateStats {
            lsh_time_ns: (hashed - start).as_nanos() as u64,
            hash_table_time_ns: hashed.elapsed().as_nanos() as u64,
            num_candidates: count as u64,
        }
    }

    pub fn candidates_with_duplicates(
        &self,
        q: &P,
        num_probes: usize,
        max_num_candidates: Option<usize>,
    ) -> Vec<usize> {
        let mut result = Vec::new();
        self.for_each_candidate(q, num_probes, max_num_candidates, |key| result.push(key));
        result
    }

    /// Distinct candidates in discovery order.
    pub fn unique_candidates(
        &self,
        q: &P,
        num_probes: usize,
        max_num_candidates: Option<usize>,
    ) -> Vec<usize> {
        self.unique_candidates_with_stats(q, num_probes, max_num_candidates).0
    }

    pub(crate) fn unique_candidates_with_stats(
        &self,
        q: &P,
        num_probes: usize,
        max_num_candidates: Option<usize>,
    ) -> (Vec<usize>, CandidateStats) {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let stats = self.for_each_candidate(q, num_probes, max_num_candidates, |key| {
            if seen.insert(key) {
                result.push(key);
            }
        });
        (result, stats)
    }

    pub fn unique_sorted_candidates(
        &self,
        q: &P,
        num_probes: usize,
        max_num_candidates: Option<usize>,
    ) -> Vec<usize> {
        let mut result = self.unique_candidates(q, num_probes, max_num_candidates);
        result.sort_unstable();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HyperplaneHash;
    use crate::point::DenseVector;
    use crate::storage::ArrayDataStorage;
    use ndarray::Array1;

    #[test]
    fn test_bucket_table_groups_keys() {
        let mut table = BucketTableFactory::new(10).new_table();
        table.add_entries(&[7, 3, 7, 1, 3, 7]);
        assert_eq!(table.bucket(7), &[0, 2, 5]);
        assert_eq!(table.bucket(3), &[1, 4]);
        assert_eq!(table.bucket(1), &[3]);
        assert!(table.bucket(42).is_empty());
        assert_eq!(table.num_buckets(), 3);
        assert_eq!(table.num_entries(), 6);
    }

    #[test]
    fn test_composite_table_keeps_tables_apart() {
        let factory = BucketTableFactory::new(8);
        let mut composite = CompositeHashTable::new(2, &factory);
        composite.add_entries_for_table(0, &[0, 0, 1]);
        composite.add_entries_for_table(1, &[1, 0, 0]);
        assert_eq!(composite.bucket(0, 0), &[0, 1]);
        assert_eq!(composite.bucket(1, 0), &[1, 2]);
        assert_eq!(composite.l(), 2);
    }

    fn small_table(points: &[DenseVector]) -> StaticLshTable<DenseVector, HyperplaneHash> {
        let factory = BucketTableFactory::new(2 * points.len());
        let composite = CompositeHashTable::new(4, &factory);
        let storage = ArrayDataStorage::new(points);
        StaticLshTable::build(HyperplaneHash::new(3, 2, 4, 99), composite, &storage)
    }

    fn points() -> Vec<DenseVector> {
        (0..20)
            .map(|i| Array1::from_shape_fn(3, |j| ((i * 3 + j) as f32 * 0.7).sin()))
            .collect()
    }

    #[test]
    fn test_every_point_lands_in_every_table() {
        let points = points();
        let table = small_table(&points);
        let stats = TableStats::collect(table.composite_table(), table.num_points(), 40);
        assert_eq!(stats.num_points, 20);
        assert_eq!(stats.bucket_capacity, 40);
        assert_eq!(stats.num_tables, 4);
        for t in table.composite_table().tables() {
            assert_eq!(t.num_entries(), 20);
        }
    }

    #[test]
    fn test_point_is_candidate_for_itself() {
        let points = points();
        let table = small_table(&points);
        let cands = table.query().unique_candidates(&points[5], 4, None);
        assert!(cands.contains(&5));
    }

    #[test]
    fn test_max_candidates_caps_raw_count() {
        let points = points();
        let table = small_table(&points);
        let all = table.query().candidates_with_duplicates(&points[0], 16, None);
        let capped = table.query().candidates_with_duplicates(&points[0], 16, Some(3));
        assert_eq!(capped.len(), 3.min(all.len()));
        assert_eq!(capped[..], all[..capped.len()]);
    }

    #[test]
    fn test_unique_variants_agree() {
        let points = points();
        let table = small_table(&points);
        let q = &points[11];
        let dup = table.query().candidates_with_duplicates(q, 8, None);
        let unique = table.query().unique_candidates(q, 8, None);
        let sorted = table.query().unique_sorted_candidates(q, 8, None);

        let mut expected: Vec<usize> = dup.clone();
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(sorted, expected);

        let mut unique_sorted = unique.clone();
        unique_sorted.sort_unstable();
        assert_eq!(unique_sorted, expected);
    }
}
