use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::prelude::*;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use supemb::builder::{EmbeddingParams, SupEmbBuilder};
use supemb::diagnostics::LogDiagnostics;
use supemb::embedding::DomainInputs;
use supemb::similarity::knn;

/// Non-negative count-like matrix; rows alternate between two topic patterns.
fn generate_documents(n_rows: usize, n_cols: usize, seed: u64) -> DenseMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_rows);
    for i in 0..n_rows {
        let topic = i % 2;
        let row: Vec<f64> = (0..n_cols)
            .map(|j| {
                let boost = if j % 2 == topic { 1.0 } else { 0.0 };
                (2.0 * boost + rng.random_range(0.0f64..1.5)).floor()
            })
            .collect();
        rows.push(row);
    }
    DenseMatrix::from_2d_vec(&rows).unwrap()
}

fn generate_features(n_rows: usize, n_cols: usize, seed: u64) -> DenseMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..n_rows)
        .map(|_| (0..n_cols).map(|_| rng.random_range(-1.0f64..1.0)).collect())
        .collect();
    DenseMatrix::from_2d_vec(&rows).unwrap()
}

/// `n_docs` documents per matrix, `m` pivots, `r` domain features, `f` latent features.
fn setup_inputs(n_docs: usize, m: usize, r: usize, f: usize, seed: u64) -> DomainInputs {
    let width = m + r;
    DomainInputs {
        ua: generate_features(m, f, seed),
        ub: generate_features(m, f, seed + 1),
        a: generate_features(r, f, seed + 2),
        b: generate_features(r, f, seed + 3),
        xla_pos: generate_documents(n_docs / 2, width, seed + 4),
        xla_neg: generate_documents(n_docs / 2, width, seed + 5),
        xua: generate_documents(n_docs, width, seed + 6),
        xub: generate_documents(n_docs, width, seed + 7),
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    // Group 1: neighbour search
    let mut group_knn = c.benchmark_group("knn");
    group_knn.warm_up_time(Duration::from_millis(500));
    group_knn.measurement_time(Duration::from_secs(3));
    group_knn.sample_size(20);

    for &k in &[2, 5, 10, 20] {
        group_knn.bench_function(BenchmarkId::new("k_variation", k), |b| {
            b.iter_batched(
                || generate_documents(300, 64, 42),
                |docs| black_box(knn(&docs, k, &LogDiagnostics).unwrap()),
                BatchSize::SmallInput,
            )
        });
    }
    group_knn.finish();

    // Group 2: joint matrix assembly as the document count grows
    let mut group_joint = c.benchmark_group("joint_matrix_scalability");
    group_joint.warm_up_time(Duration::from_millis(300));
    group_joint.measurement_time(Duration::from_secs(4));
    group_joint.sample_size(10);

    for &n_docs in &[50, 100, 200, 400] {
        group_joint.bench_function(BenchmarkId::new("documents", n_docs), |b| {
            b.iter_batched(
                || {
                    SupEmbBuilder::new()
                        .with_knn(5, 5, 5)
                        .with_diagnostics(Arc::new(LogDiagnostics))
                        .build(setup_inputs(n_docs, 40, 60, 32, 7))
                        .unwrap()
                },
                |supemb| black_box(supemb.joint_matrix().unwrap()),
                BatchSize::SmallInput,
            )
        });
    }
    group_joint.finish();

    // Group 3: SVD and projection over a fixed joint matrix
    let mut group_projection = c.benchmark_group("projection");
    group_projection.warm_up_time(Duration::from_millis(300));
    group_projection.measurement_time(Duration::from_secs(3));
    group_projection.sample_size(10);

    for &dims in &[8, 32, 60] {
        let params = EmbeddingParams { dims, ..EmbeddingParams::default() };
        let supemb = SupEmbBuilder::new()
            .with_params(params)
            .build(setup_inputs(100, 40, 60, 32, 11))
            .unwrap();
        let q = supemb.joint_matrix().unwrap();

        group_projection.bench_function(BenchmarkId::new("dims", dims), |b| {
            b.iter(|| {
                let projection = supemb.projection(&q).unwrap();
                let projected = supemb
                    .project_source(&supemb.inputs().xla_pos, &projection)
                    .unwrap();
                black_box(projected);
            })
        });
    }
    group_projection.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
