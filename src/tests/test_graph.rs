use approx::assert_abs_diff_eq;
use smartcore::linalg::basic::arrays::Array;

use crate::diagnostics::LogDiagnostics;
use crate::error::SupEmbError;
use crate::graph::{labelled_graph, structural_graph, unlabelled_graph, GraphRule};
use crate::io::to_dense;
use crate::similarity::cosine_similarity;
use crate::tests::test_helpers::{matrix, target_unlabelled};

fn two_clusters() -> smartcore::linalg::basic::matrix::DenseMatrix<f64> {
    matrix(&[&[1.0, 0.0], &[1.0, 0.1], &[0.0, 1.0], &[0.1, 1.0]])
}

#[test]
fn test_structural_graph_pairs_pivots() {
    crate::tests::init();
    let m = 5;
    let w1 = structural_graph(m, &LogDiagnostics);

    assert_eq!(w1.shape(), (2 * m, 2 * m));
    assert_eq!(w1.nnz(), 2 * m);
    for (&v, (i, j)) in w1.iter() {
        assert_eq!(v, 1.0);
        assert_eq!((i as isize - j as isize).unsigned_abs(), m);
    }

    let dense = to_dense(&w1).unwrap();
    for i in 0..2 * m {
        for j in 0..2 * m {
            assert_eq!(dense.get((i, j)), dense.get((j, i)));
        }
    }
}

#[test]
fn test_labelled_graph_same_label_pairs_are_negative() {
    crate::tests::init();
    let x = two_clusters();
    let lambda_2 = 2.0;
    let w2 = labelled_graph(&x, &[1, 1, -1, -1], 2, lambda_2, &LogDiagnostics).unwrap();
    let s = cosine_similarity(&x).unwrap();

    assert_eq!(w2.rule, GraphRule::Labelled);
    assert_eq!(w2.shape(), (4, 4));
    assert_abs_diff_eq!(w2.get(0, 1), -lambda_2 * s.get((0, 1)), epsilon = 1e-12);
    assert_abs_diff_eq!(w2.get(2, 3), -lambda_2 * s.get((2, 3)), epsilon = 1e-12);
    assert_abs_diff_eq!(w2.get(0, 0), -lambda_2, epsilon = 1e-12);
    // not mutual neighbours
    assert_eq!(w2.get(0, 2), 0.0);
    assert_eq!(w2.get(1, 3), 0.0);
    assert!(w2.is_symmetric(1e-12));

    let printed = format!("{}", w2);
    assert!(printed.starts_with("WeightGraph Labelled"));
    assert!(w2.sparsity() > 0.0);
}

#[test]
fn test_labelled_graph_cross_label_pairs_are_positive() {
    let x = two_clusters();
    let w2 = labelled_graph(&x, &[1, -1, 1, -1], 2, 3.0, &LogDiagnostics).unwrap();
    let s = cosine_similarity(&x).unwrap();

    assert_abs_diff_eq!(w2.get(0, 1), *s.get((0, 1)), epsilon = 1e-12);
    assert_abs_diff_eq!(w2.get(3, 2), *s.get((3, 2)), epsilon = 1e-12);
    assert!(w2.get(0, 1) > 0.0);
}

#[test]
fn test_labelled_graph_keeps_only_mutual_pairs() {
    // row 2 lists row 1 but row 1 prefers row 0
    let x = matrix(&[&[1.0, 0.0], &[1.0, 0.2], &[0.6, 1.0]]);
    let w2 = labelled_graph(&x, &[1, 1, 1], 2, 1.0, &LogDiagnostics).unwrap();

    assert_eq!(w2.get(2, 1), 0.0);
    assert_eq!(w2.get(1, 2), 0.0);
    assert!(w2.get(0, 1) < 0.0);
}

#[test]
fn test_labelled_graph_rejects_label_mismatch() {
    let x = two_clusters();
    let err = labelled_graph(&x, &[1, -1], 2, 1.0, &LogDiagnostics).unwrap_err();
    assert!(matches!(err, SupEmbError::ShapeMismatch { expected: 4, found: 2, .. }));
}

#[test]
fn test_unlabelled_graph_is_unmasked_similarity() {
    crate::tests::init();
    let x = target_unlabelled();
    let w3 = unlabelled_graph(&x, 1, &LogDiagnostics).unwrap();
    let s = cosine_similarity(&x).unwrap();

    assert_eq!(w3.rule, GraphRule::Unlabelled);
    assert_eq!(w3.k, 1);
    let (n, _) = w3.shape();
    for i in 0..n {
        for j in 0..n {
            assert_eq!(w3.get(i, j), *s.get((i, j)));
        }
    }
    // pairs far outside the 1-NN sets still carry weight
    assert!(w3.nnz() > n);
}
