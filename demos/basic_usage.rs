//! Basic usage of `superbit`.
//!
//! Builds a cross-polytope table over random unit vectors, runs every query
//! variant, tunes the probe budget and prints query statistics.
//!
//! Run with:
//!   cargo run --example basic_usage

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use superbit::distance::normalize;
use superbit::*;

const DIM: usize = 128;
const NUM_VECTORS: usize = 10_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ---------------------------------------------------------------
    // 1. Generate 10,000 random unit vectors.
    // ---------------------------------------------------------------
    println!("=== Step 1: Generate data ===");
    let mut rng = StdRng::seed_from_u64(42);
    let normal = Normal::new(0.0f32, 1.0).expect("valid normal distribution");
    let points: Vec<DenseVector> = (0..NUM_VECTORS)
        .map(|_| {
            let mut v = Array1::from_shape_fn(DIM, |_| normal.sample(&mut rng));
            normalize(&mut v);
            v
        })
        .collect();
    println!("Generated {NUM_VECTORS} vectors of dimension {DIM}\n");

    // ---------------------------------------------------------------
    // 2. Pick parameters and build the table.
    // ---------------------------------------------------------------
    println!("=== Step 2: Build the table ===");
    let params = default_parameters::<DenseVector>(
        NUM_VECTORS,
        DIM as i32,
        DistanceFunction::NegativeInnerProduct,
        true,
    )
    .expect("valid default parameters");
    println!(
        "family={:?} k={} l={} last_cp_dimension={} rotations={}",
        params.lsh_family, params.k, params.l, params.last_cp_dimension, params.num_rotations
    );

    let mut table = build_index(&points, &params).expect("failed to build table");
    println!("{}\n", table.table_stats());

    // ---------------------------------------------------------------
    // 3. Query with each retrieval variant.
    // ---------------------------------------------------------------
    println!("=== Step 3: Query ===");
    let q = &points[123];
    println!("closest:            {:?}", table.find_closest(q).expect("query"));
    println!("5 nearest:          {:?}", table.find_k_nearest(q, 5).expect("query"));
    println!(
        "near (<= -0.3):     {} keys",
        table.find_near(q, -0.3).expect("query").len()
    );
    println!(
        "candidates:         {} raw, {} unique\n",
        table.candidates_with_duplicates(q).expect("query").len(),
        table.unique_candidates(q).expect("query").len()
    );

    // ---------------------------------------------------------------
    // 4. Trade speed for recall with the probe budget.
    // ---------------------------------------------------------------
    println!("=== Step 4: Probe budget ===");
    for probes in [10, 40, 160] {
        table.set_num_probes(probes).expect("positive probe count");
        table.reset_statistics();
        for q in points.iter().take(200) {
            table.find_k_nearest(q, 10).expect("query");
        }
        println!("probes={probes:<4} {}", table.statistics());
    }

    // ---------------------------------------------------------------
    // 5. Bound latency with a candidate cap.
    // ---------------------------------------------------------------
    println!("\n=== Step 5: Candidate cap ===");
    table.set_max_num_candidates(Some(200));
    table.reset_statistics();
    for q in points.iter().take(200) {
        table.find_k_nearest(q, 10).expect("query");
    }
    println!("cap=200    {}", table.statistics());
}
