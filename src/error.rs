//! Error taxonomy for the embedding pipeline.
//!
//! Shape violations, infeasible solver requests and I/O failures are fatal and
//! surface as [`SupEmbError`]. Degenerate rows (zero degree) are not errors:
//! they are recovered in [`crate::laplacian::inverse_degree`] and reported
//! through the diagnostics sink.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SupEmbError>;

#[derive(Debug, Error)]
pub enum SupEmbError {
    /// Precondition failure among the input matrices.
    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("matrix {what} is empty")]
    EmptyMatrix { what: &'static str },

    /// Requested rank is outside `1..order` for the SVD solver.
    #[error("cannot retain {dims} singular triplets of a {order}x{order} matrix (need 1 <= dims < {order})")]
    InfeasibleRank { dims: usize, order: usize },

    #[error("SVD of {order}x{order} matrix did not converge (max iterations: {max_iterations})")]
    SvdNonConvergence { order: usize, max_iterations: usize },

    #[error("matrix is not symmetric: |Q[{row},{col}] - Q[{col},{row}]| = {deviation:e}")]
    Asymmetric {
        row: usize,
        col: usize,
        deviation: f64,
    },

    #[error("failed to read matrix from {}: {source}", path.display())]
    MatrixRead {
        path: PathBuf,
        #[source]
        source: sprs::io::IoError,
    },

    /// Malformed dense (`array`) MatrixMarket file.
    #[error("malformed matrix file {}: {reason}", path.display())]
    MatrixParse { path: PathBuf, reason: String },

    #[error("failed to write matrix to {}: {source}", path.display())]
    MatrixWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("linear algebra failure: {0}")]
    Linalg(String),

    #[error("classifier failure: {0}")]
    Classifier(String),
}

impl From<smartcore::error::Failed> for SupEmbError {
    fn from(failed: smartcore::error::Failed) -> Self {
        SupEmbError::Linalg(failed.to_string())
    }
}
