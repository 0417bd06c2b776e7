use approx::assert_abs_diff_eq;
use smartcore::linalg::basic::arrays::Array;

use crate::diagnostics::{LogDiagnostics, RecordingDiagnostics, Stage};
use crate::similarity::{cosine_similarity, knn, normalise_rows, NeighbourSets};
use crate::tests::test_helpers::{matrix, source_unlabelled};

use log::debug;

#[test]
fn test_normalise_rows_unit_norm_and_zero_rows() {
    crate::tests::init();
    let m = matrix(&[&[3.0, 4.0], &[0.0, 0.0], &[0.0, -2.0]]);
    let n = normalise_rows(&m).unwrap();

    assert_abs_diff_eq!(*n.get((0, 0)), 0.6, epsilon = 1e-12);
    assert_abs_diff_eq!(*n.get((0, 1)), 0.8, epsilon = 1e-12);
    assert_eq!(*n.get((1, 0)), 0.0);
    assert_eq!(*n.get((1, 1)), 0.0);
    assert_abs_diff_eq!(*n.get((2, 1)), -1.0, epsilon = 1e-12);
}

#[test]
fn test_cosine_similarity_range_and_diagonal() {
    crate::tests::init();
    let x = source_unlabelled();
    let s = cosine_similarity(&x).unwrap();
    let (n, cols) = s.shape();
    assert_eq!((n, cols), (9, 9));

    for i in 0..n {
        assert_abs_diff_eq!(*s.get((i, i)), 1.0, epsilon = 1e-12);
        for j in 0..n {
            let v = *s.get((i, j));
            assert!((-1.0..=1.0).contains(&v), "S[{},{}] = {} out of range", i, j, v);
            assert_eq!(v, *s.get((j, i)));
        }
    }
}

#[test]
fn test_cosine_similarity_known_values() {
    let m = matrix(&[&[1.0, 0.0], &[1.0, 1.0], &[-1.0, 0.0]]);
    let s = cosine_similarity(&m).unwrap();
    assert_abs_diff_eq!(*s.get((0, 1)), 1.0 / 2f64.sqrt(), epsilon = 1e-12);
    assert_abs_diff_eq!(*s.get((0, 2)), -1.0, epsilon = 1e-12);
}

#[test]
fn test_knn_sets_have_k_members_and_include_self() {
    crate::tests::init();
    let x = source_unlabelled();
    let n = x.shape().0;
    let diagnostics = RecordingDiagnostics::new();

    for k in 1..=n {
        let graph = knn(&x, k, &diagnostics).unwrap();
        assert_eq!(graph.k, k);
        assert_eq!(graph.neighbours.len(), n);
        for (i, set) in graph.neighbours.iter().enumerate() {
            debug!("k={} row {} neighbours {:?}", k, i, set);
            assert_eq!(set.len(), k, "k={} row {}", k, i);
            assert!(set.contains(&i), "row {} should list itself at k={}", i, k);
            assert!(set.windows(2).all(|w| w[0] < w[1]));
        }
    }
    assert_eq!(diagnostics.stage_timings(Stage::Knn).len(), n);
}

#[test]
fn test_knn_picks_most_similar_rows() {
    let m = matrix(&[&[1.0, 0.0], &[1.0, 0.1], &[0.0, 1.0], &[0.1, 1.0]]);
    let graph = knn(&m, 2, &LogDiagnostics).unwrap();

    assert_eq!(graph.neighbours.neighbours(0), &[0, 1]);
    assert_eq!(graph.neighbours.neighbours(1), &[0, 1]);
    assert_eq!(graph.neighbours.neighbours(2), &[2, 3]);
    assert_eq!(graph.neighbours.neighbours(3), &[2, 3]);
    assert!(graph.neighbours.is_mutual(0, 1));
    assert!(!graph.neighbours.contains(0, 2));
}

#[test]
fn test_knn_clips_k_to_row_count() {
    let m = matrix(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]]);
    let graph = knn(&m, 10, &LogDiagnostics).unwrap();

    assert_eq!(graph.k, 3);
    for set in graph.neighbours.iter() {
        assert_eq!(set, &[0, 1, 2]);
    }
}

#[test]
fn test_knn_tolerates_zero_rows() {
    let m = matrix(&[&[1.0, 0.0], &[0.0, 0.0], &[0.5, 0.5]]);
    let graph = knn(&m, 2, &LogDiagnostics).unwrap();

    for j in 0..3 {
        assert_eq!(*graph.similarity.get((1, j)), 0.0);
        assert!(graph.similarity.get((1, j)).is_finite());
    }
    assert_eq!(graph.neighbours.neighbours(1).len(), 2);
}

#[test]
fn test_neighbour_sets_are_sorted_and_deduplicated() {
    let sets = NeighbourSets::new(vec![vec![3, 1, 1], vec![0]]);
    assert_eq!(sets.neighbours(0), &[1, 3]);
    assert!(sets.contains(0, 3));
    assert!(sets.is_mutual(0, 1));
    assert!(!sets.is_empty());
}

#[test]
fn test_one_sided_neighbour_is_not_mutual() {
    // row 0 lists row 2, row 2 does not list row 0
    let sets = NeighbourSets::new(vec![vec![0, 2], vec![1], vec![1, 2]]);
    assert!(sets.contains(0, 2));
    assert!(!sets.contains(2, 0));
    assert!(!sets.is_mutual(0, 2));
    assert!(!sets.is_mutual(2, 0));
    assert!(!sets.is_mutual(1, 2));
    assert!(sets.is_mutual(1, 1));
}
