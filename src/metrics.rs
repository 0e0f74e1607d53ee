use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::table::CandidateStats;

/// Cumulative query counters, updated lock-free from concurrent queries.
#[derive(Debug, Default)]
pub struct StatisticsCollector {
    num_queries: AtomicU64,
    total_query_time_ns: AtomicU64,
    lsh_time_ns: AtomicU64,
    hash_table_time_ns: AtomicU64,
    distance_time_ns: AtomicU64,
    num_candidates: AtomicU64,
    num_unique_candidates: AtomicU64,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_query(
        &self,
        candidates: &CandidateStats,
        num_unique_candidates: u64,
        distance_time_ns: u64,
        total_time_ns: u64,
    ) {
        self.num_queries.fetch_add(1, Ordering::Relaxed);
        self.total_query_time_ns
            .fetch_add(total_time_ns, Ordering::Relaxed);
        self.lsh_time_ns
            .fetch_add(candidates.lsh_time_ns, Ordering::Relaxed);
        self.hash_table_time_ns
            .fetch_add(candidates.hash_table_time_ns, Ordering::Relaxed);
        self.distance_time_ns
            .fetch_add(distance_time_ns, Ordering::Relaxed);
        self.num_candidates
            .fetch_add(candidates.num_candidates, Ordering::Relaxed);
        self.num_unique_candidates
            .fetch_add(num_unique_candidates, Ordering::Relaxed);
    }

    /// Averages over all queries recorded since the last reset.
    pub fn snapshot(&self) -> QueryStatistics {
        let num_queries = self.num_queries.load(Ordering::Relaxed);
        let avg = |total: &AtomicU64, scale: f64| {
            if num_queries > 0 {
                total.load(Ordering::Relaxed) as f64 / num_queries as f64 / scale
            } else {
                0.0
            }
        };

        QueryStatistics {
            num_queries,
            average_total_query_time_us: avg(&self.total_query_time_ns, 1000.0),
            average_lsh_time_us: avg(&self.lsh_time_ns, 1000.0),
            average_hash_table_time_us: avg(&self.hash_table_time_ns, 1000.0),
            average_distance_time_us: avg(&self.distance_time_ns, 1000.0),
            average_num_candidates: avg(&self.num_candidates, 1.0),
            average_num_unique_candidates: avg(&self.num_unique_candidates, 1.0),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.num_queries.store(0, Ordering::Relaxed);
        self.total_query_time_ns.store(0, Ordering::Relaxed);
        self.lsh_time_ns.store(0, Ordering::Relaxed);
        self.hash_table_time_ns.store(0, Ordering::Relaxed);
        self.distance_time_ns.store(0, Ordering::Relaxed);
        self.num_candidates.store(0, Ordering::Relaxed);
        self.num_unique_candidates.store(0, Ordering::Relaxed);
    }
}

/// Diagnostic averages over the nearest-neighbor queries run since the last
/// reset. Not used for correctness.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryStatistics {
    pub num_queries: u64,
    pub average_total_query_time_us: f64,
    /// Hashing the query and ranking its probes.
    pub average_lsh_time_us: f64,
    /// Walking the probed buckets.
    pub average_hash_table_time_us: f64,
    /// Computing true distances to candidates.
    pub average_distance_time_us: f64,
    /// Raw candidates, duplicates included.
    pub average_num_candidates: f64,
    pub average_num_unique_candidates: f64,
}

impl std::fmt::Display for QueryStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Queries: {}, Avg query: {:.2}us (lsh {:.2}us, tables {:.2}us, distances {:.2}us), \
             Avg candidates: {:.1} ({:.1} unique)",
            self.num_queries,
            self.average_total_query_time_us,
            self.average_lsh_time_us,
            self.average_hash_table_time_us,
            self.average_distance_time_us,
            self.average_num_candidates,
            self.average_num_unique_candidates,
        )
    }
}

/// Wall-clock timer for one operation.
pub(crate) struct QueryTimer {
    start: Instant,
}

impl QueryTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}
