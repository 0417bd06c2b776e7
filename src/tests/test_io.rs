use approx::assert_abs_diff_eq;
use smartcore::linalg::basic::arrays::Array;
use tempfile::tempdir;

use crate::diagnostics::{LogDiagnostics, RecordingDiagnostics, Stage};
use crate::error::SupEmbError;
use crate::io::{load_matrix, save_matrix, to_dense, to_sparse};
use crate::tests::test_helpers::{matrix, source_unlabelled};

#[test]
fn test_save_then_load_reproduces_entries() {
    crate::tests::init();
    let dir = tempdir().unwrap();
    let path = dir.path().join("Q.mtx");
    let q = matrix(&[
        &[1.5, -0.25, 0.0],
        &[-0.25, 3.0e-9, 7.0],
        &[0.0, 7.0, -123.456789],
    ]);

    let diagnostics = RecordingDiagnostics::new();
    save_matrix(&path, &q, &diagnostics).unwrap();
    let back = load_matrix(&path, &diagnostics).unwrap();

    assert_eq!(back.shape(), (3, 3));
    for i in 0..3 {
        for j in 0..3 {
            assert_abs_diff_eq!(*back.get((i, j)), *q.get((i, j)), epsilon = 1e-12);
        }
    }
    assert_eq!(diagnostics.stage_timings(Stage::MatrixIo).len(), 2);
}

#[test]
fn test_rectangular_document_matrix_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("XuA.mtx");
    let x = source_unlabelled();
    save_matrix(&path, &x, &LogDiagnostics).unwrap();
    let back = load_matrix(&path, &LogDiagnostics).unwrap();
    assert_eq!(back.shape(), (9, 10));
    assert_eq!(*back.get((6, 3)), 2.0);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_matrix(dir.path().join("absent.mtx"), &LogDiagnostics).unwrap_err();
    assert!(matches!(err, SupEmbError::MatrixRead { .. }));
}

#[test]
fn test_sparse_conversion_drops_zeros() {
    let m = matrix(&[&[0.0, 2.0], &[0.0, 0.0], &[-1.0, 0.0]]);
    let s = to_sparse(&m);
    assert_eq!(s.nnz(), 2);
    assert_eq!(s.shape(), (3, 2));
    let dense = to_dense(&s).unwrap();
    assert_eq!(*dense.get((0, 1)), 2.0);
    assert_eq!(*dense.get((2, 0)), -1.0);
}

#[test]
fn test_load_dense_array_layout_is_column_major() {
    crate::tests::init();
    let dir = tempdir().unwrap();
    let path = dir.path().join("Q.mtx");
    std::fs::write(&path, "%%MatrixMarket matrix array real general\n2 2\n1\n2\n3\n4\n").unwrap();

    let diagnostics = RecordingDiagnostics::new();
    let m = load_matrix(&path, &diagnostics).unwrap();
    assert_eq!(m.shape(), (2, 2));
    assert_eq!(*m.get((0, 0)), 1.0);
    assert_eq!(*m.get((1, 0)), 2.0);
    assert_eq!(*m.get((0, 1)), 3.0);
    assert_eq!(*m.get((1, 1)), 4.0);
    assert_eq!(diagnostics.stage_timings(Stage::MatrixIo).len(), 1);
}

#[test]
fn test_load_symmetric_array_mirrors_lower_triangle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Q.mtx");
    std::fs::write(
        &path,
        "%%MatrixMarket matrix array real symmetric\n\
         % written by scipy.io.mmwrite\n\
         3 3\n\
         1.0\n-0.5\n2.5e-1\n\
         4.0\n7.0\n\
         -9.0\n",
    )
    .unwrap();

    let q = load_matrix(&path, &LogDiagnostics).unwrap();
    let expected = matrix(&[&[1.0, -0.5, 0.25], &[-0.5, 4.0, 7.0], &[0.25, 7.0, -9.0]]);
    for i in 0..3 {
        for j in 0..3 {
            assert_abs_diff_eq!(*q.get((i, j)), *expected.get((i, j)), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_load_skew_symmetric_array_has_zero_diagonal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("S.mtx");
    std::fs::write(&path, "%%MatrixMarket matrix array real skew-symmetric\n2 2\n3.0\n").unwrap();

    let s = load_matrix(&path, &LogDiagnostics).unwrap();
    assert_eq!(*s.get((0, 0)), 0.0);
    assert_eq!(*s.get((1, 0)), 3.0);
    assert_eq!(*s.get((0, 1)), -3.0);
    assert_eq!(*s.get((1, 1)), 0.0);
}

#[test]
fn test_truncated_array_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Q.mtx");
    std::fs::write(&path, "%%MatrixMarket matrix array real general\n2 2\n1\n2\n3\n").unwrap();

    let err = load_matrix(&path, &LogDiagnostics).unwrap_err();
    assert!(matches!(err, SupEmbError::MatrixParse { .. }));
    assert!(err.to_string().contains("expected 4 values, found 3"));
}

#[test]
fn test_complex_array_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Q.mtx");
    std::fs::write(&path, "%%MatrixMarket matrix array complex general\n1 1\n1 0\n").unwrap();

    let err = load_matrix(&path, &LogDiagnostics).unwrap_err();
    assert!(matches!(err, SupEmbError::MatrixParse { .. }));
}
