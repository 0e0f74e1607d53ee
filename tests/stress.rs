use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::thread;
use superbit::distance::normalize;
use superbit::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn random_unit_vector(rng: &mut StdRng, dim: usize) -> DenseVector {
    let normal = Normal::new(0.0f32, 1.0).unwrap();
    let mut v = Array1::from_shape_fn(dim, |_| normal.sample(rng));
    normalize(&mut v);
    v
}

fn random_points(n: usize, dim: usize, seed: u64) -> Vec<DenseVector> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| random_unit_vector(&mut rng, dim)).collect()
}

/// Each point plus a little Gaussian noise, renormalized.
fn perturbed(points: &[DenseVector], sigma: f32, seed: u64) -> Vec<DenseVector> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0f32, sigma).unwrap();
    points
        .iter()
        .map(|p| {
            let mut q = p.mapv(|x| x + noise.sample(&mut rng));
            normalize(&mut q);
            q
        })
        .collect()
}

fn brute_force_closest(points: &[DenseVector], q: &DenseVector) -> usize {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, -q.dot(p)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
        .unwrap()
}

fn cross_polytope_params(dim: i32, n: usize) -> LshParams {
    default_parameters::<DenseVector>(n, dim, DistanceFunction::NegativeInnerProduct, true)
        .unwrap()
}

// ---------------------------------------------------------------------------
// 1. Concurrent read-only queries agree with sequential ones
//    8 threads query the same table; every result must match the result
//    computed on the main thread beforehand.
// ---------------------------------------------------------------------------

#[test]
fn stress_concurrent_queries_are_deterministic() {
    let dim = 32;
    let points = random_points(5_000, dim, 1);
    let queries = random_points(200, dim, 2);

    let mut table = build_index(&points, &cross_polytope_params(dim as i32, points.len())).unwrap();
    table.set_num_probes(40).unwrap();

    let expected: Vec<Vec<usize>> = queries
        .iter()
        .map(|q| table.find_k_nearest(q, 10).unwrap())
        .collect();

    let table = &*table;
    thread::scope(|s| {
        for t in 0..8 {
            let queries = &queries;
            let expected = &expected;
            s.spawn(move || {
                for (i, q) in queries.iter().enumerate().skip(t).step_by(8) {
                    assert_eq!(&table.find_k_nearest(q, 10).unwrap(), &expected[i]);
                    let closest = table.find_closest(q).unwrap();
                    assert_eq!(closest, expected[i].first().copied());
                }
            });
        }
    });

    assert!(table.statistics().num_queries > 200);
}

// ---------------------------------------------------------------------------
// 2. Recall on near-duplicate queries
//    Queries are dataset points with small noise; their true nearest neighbor
//    is the unperturbed point almost surely.
// ---------------------------------------------------------------------------

#[test]
fn stress_recall_cross_polytope() {
    let dim = 32;
    let points = random_points(2_000, dim, 3);
    let queries = perturbed(&points[..100], 0.01, 4);

    let mut table = build_index(&points, &cross_polytope_params(dim as i32, points.len())).unwrap();
    table.set_num_probes(50).unwrap();

    let hits = queries
        .iter()
        .enumerate()
        .filter(|(i, q)| {
            assert_eq!(brute_force_closest(&points, q), *i);
            table.find_closest(q).unwrap() == Some(*i)
        })
        .count();
    assert!(hits >= 90, "recall too low: {hits}/100");
}

#[test]
fn stress_recall_hyperplane() {
    let dim = 32;
    let points = random_points(2_000, dim, 5);
    let queries = perturbed(&points[..100], 0.01, 6);

    let params = LshParams::builder()
        .dimension(dim as i32)
        .family(LshFamily::Hyperplane)
        .distance_function(DistanceFunction::NegativeInnerProduct)
        .k(9)
        .l(10)
        .seed(7)
        .build();
    let mut table = build_index(&points, &params).unwrap();
    table.set_num_probes(60).unwrap();

    let hits = queries
        .iter()
        .enumerate()
        .filter(|(i, q)| table.find_closest(q).unwrap() == Some(*i))
        .count();
    assert!(hits >= 90, "recall too low: {hits}/100");
}

// ---------------------------------------------------------------------------
// 3. Probe budget sweep
//    The probe sequence for a smaller budget is a prefix of the one for a
//    larger budget, so unique candidates can only grow.
// ---------------------------------------------------------------------------

#[test]
fn stress_probe_sweep_monotone() {
    let dim = 64;
    let points = random_points(3_000, dim, 8);
    let queries = random_points(25, dim, 9);
    let mut table = build_index(&points, &cross_polytope_params(dim as i32, points.len())).unwrap();

    for q in &queries {
        let mut previous = 0;
        for probes in [10, 20, 40, 80, 160] {
            table.set_num_probes(probes).unwrap();
            let n = table.unique_candidates(q).unwrap().len();
            assert!(n >= previous, "{probes} probes gave {n} < {previous}");
            previous = n;
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Candidate cap bounds work on a large table
// ---------------------------------------------------------------------------

#[test]
fn stress_candidate_cap() {
    let dim = 16;
    let points = random_points(20_000, dim, 10);
    let params = LshParams::builder()
        .dimension(dim as i32)
        .family(LshFamily::Hyperplane)
        .distance_function(DistanceFunction::NegativeInnerProduct)
        .k(4)
        .l(8)
        .build();
    let mut table = build_index(&points, &params).unwrap();
    table.set_num_probes(64).unwrap();
    table.set_max_num_candidates(Some(500));

    for q in random_points(20, dim, 11).iter() {
        assert_eq!(table.candidates_with_duplicates(q).unwrap().len(), 500);
        assert!(table.unique_candidates(q).unwrap().len() <= 500);
    }
}

// ---------------------------------------------------------------------------
// 5. Parallel batch queries (behind `parallel`)
// ---------------------------------------------------------------------------

#[cfg(feature = "parallel")]
#[test]
fn stress_parallel_batch_matches_sequential() {
    let dim = 32;
    let points = random_points(4_000, dim, 12);
    let queries = random_points(100, dim, 13);
    let table = build_index(&points, &cross_polytope_params(dim as i32, points.len())).unwrap();

    let batch = table.par_find_k_nearest_batch(&queries, 5).unwrap();
    for (q, result) in queries.iter().zip(&batch) {
        assert_eq!(&table.find_k_nearest(q, 5).unwrap(), result);
    }
}
