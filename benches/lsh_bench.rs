use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use superbit::distance::normalize;
use superbit::{
    build_index, default_parameters, DenseVector, DistanceFunction, LshFamily, LshParams,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn generate_vectors(count: usize, dim: usize, seed: u64) -> Vec<DenseVector> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut v = Array1::from_shape_fn(dim, |_| StandardNormal.sample(&mut rng));
            normalize(&mut v);
            v
        })
        .collect()
}

fn brute_force_query(dataset: &[DenseVector], query: &DenseVector, k: usize) -> Vec<usize> {
    let mut dists: Vec<(usize, f32)> = dataset
        .iter()
        .enumerate()
        .map(|(id, v)| (id, -query.dot(v)))
        .collect();
    dists.sort_by(|a, b| a.1.total_cmp(&b.1));
    dists.truncate(k);
    dists.into_iter().map(|(id, _)| id).collect()
}

fn hyperplane_params(dim: usize) -> LshParams {
    LshParams::builder()
        .dimension(dim as i32)
        .family(LshFamily::Hyperplane)
        .distance_function(DistanceFunction::NegativeInnerProduct)
        .k(12)
        .l(10)
        .seed(42)
        .build()
}

fn cross_polytope_params(dim: usize, n: usize) -> LshParams {
    default_parameters::<DenseVector>(n, dim as i32, DistanceFunction::NegativeInnerProduct, true)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Build time
// ---------------------------------------------------------------------------

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(10);

    for &dim in &[128, 768] {
        for &n in &[1_000usize, 10_000] {
            let vecs = generate_vectors(n, dim, 99);

            group.bench_with_input(
                BenchmarkId::new(format!("hyperplane/dim={dim}"), n),
                &n,
                |b, _| {
                    b.iter(|| build_index(&vecs, &hyperplane_params(dim)).unwrap());
                },
            );

            group.bench_with_input(
                BenchmarkId::new(format!("cross_polytope/dim={dim}"), n),
                &n,
                |b, _| {
                    b.iter(|| build_index(&vecs, &cross_polytope_params(dim, n)).unwrap());
                },
            );
        }
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Single query latency
// ---------------------------------------------------------------------------

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let k = 10;

    for &dim in &[128, 768] {
        for &n in &[1_000usize, 10_000, 100_000] {
            let vecs = generate_vectors(n, dim, 99);
            let query_vec = generate_vectors(1, dim, 1234).remove(0);

            let table = build_index(&vecs, &cross_polytope_params(dim, n)).unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("k_nearest/dim={dim}"), n),
                &n,
                |b, _| {
                    b.iter(|| table.find_k_nearest(&query_vec, k).unwrap());
                },
            );

            group.bench_with_input(
                BenchmarkId::new(format!("unique_sorted/dim={dim}"), n),
                &n,
                |b, _| {
                    b.iter(|| table.unique_sorted_candidates(&query_vec).unwrap());
                },
            );

            group.bench_with_input(
                BenchmarkId::new(format!("brute/dim={dim}"), n),
                &n,
                |b, _| {
                    b.iter(|| brute_force_query(&vecs, &query_vec, k));
                },
            );
        }
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Probe budget
// ---------------------------------------------------------------------------

fn bench_probes(c: &mut Criterion) {
    let mut group = c.benchmark_group("probes");
    let dim = 128;
    let n = 50_000;
    let vecs = generate_vectors(n, dim, 99);
    let queries = generate_vectors(100, dim, 5678);
    let mut table = build_index(&vecs, &cross_polytope_params(dim, n)).unwrap();

    for &probes in &[10i64, 40, 160, 640] {
        table.set_num_probes(probes).unwrap();
        let table = &table;
        group.bench_with_input(BenchmarkId::from_parameter(probes), &probes, |b, _| {
            b.iter(|| {
                for q in &queries {
                    table.find_k_nearest(q, 10).unwrap();
                }
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_build, bench_query, bench_probes);
criterion_main!(benches);
