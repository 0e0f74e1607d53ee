//! Recall vs. probe budget for both hash families.
//!
//! Queries are dataset points with a little noise added, so the true nearest
//! neighbor is known. Prints recall@1 and the average number of unique
//! candidates for increasing probe budgets.
//!
//! Run with:
//!   cargo run --release --example probe_sweep

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::time::Instant;
use superbit::distance::normalize;
use superbit::*;

const DIM: usize = 64;
const NUM_VECTORS: usize = 50_000;
const NUM_QUERIES: usize = 500;

fn random_unit_vectors(n: usize, seed: u64) -> Vec<DenseVector> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0f32, 1.0).expect("valid normal distribution");
    (0..n)
        .map(|_| {
            let mut v = Array1::from_shape_fn(DIM, |_| normal.sample(&mut rng));
            normalize(&mut v);
            v
        })
        .collect()
}

fn sweep(name: &str, points: &[DenseVector], queries: &[DenseVector], params: &LshParams) {
    let start = Instant::now();
    let mut table = build_index(points, params).expect("failed to build table");
    println!(
        "--- {name}: k={} l={} built in {:.2?}",
        params.k,
        params.l,
        start.elapsed()
    );

    let mut probes = params.l as i64;
    while probes <= 64 * params.l as i64 {
        table.set_num_probes(probes).expect("positive probe count");
        table.reset_statistics();
        let hits = queries
            .iter()
            .enumerate()
            .filter(|(i, q)| table.find_closest(q).ok().flatten() == Some(*i))
            .count();
        let stats = table.statistics();
        println!(
            "probes={probes:<5} recall@1={:.3} unique candidates={:.1} avg query={:.1}us",
            hits as f64 / queries.len() as f64,
            stats.average_num_unique_candidates,
            stats.average_total_query_time_us,
        );
        probes *= 2;
    }
}

fn main() {
    let points = random_unit_vectors(NUM_VECTORS, 1);

    let mut rng = StdRng::seed_from_u64(2);
    let noise = Normal::new(0.0f32, 0.05).expect("valid normal distribution");
    let queries: Vec<DenseVector> = points[..NUM_QUERIES]
        .iter()
        .map(|p| {
            let mut q = p.mapv(|x| x + noise.sample(&mut rng));
            normalize(&mut q);
            q
        })
        .collect();

    let mut hyperplane = LshParams::builder()
        .dimension(DIM as i32)
        .family(LshFamily::Hyperplane)
        .distance_function(DistanceFunction::NegativeInnerProduct)
        .l(10)
        .seed(7)
        .build();
    let bits = (NUM_VECTORS as f64).log2().floor() as i32 - 2;
    compute_number_of_hash_functions::<DenseVector>(bits, &mut hyperplane)
        .expect("valid bit budget");
    sweep("hyperplane", &points, &queries, &hyperplane);

    let cross_polytope = default_parameters::<DenseVector>(
        NUM_VECTORS,
        DIM as i32,
        DistanceFunction::NegativeInnerProduct,
        true,
    )
    .expect("valid default parameters");
    sweep("cross-polytope", &points, &queries, &cross_polytope);
}
