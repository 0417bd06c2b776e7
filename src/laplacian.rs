//! # Graph Laplacians and inverse-degree scaling
//!
//! - `L(W) = W - diag(rowsum(W))`. This is the negative of the textbook
//!   `D - W`; the embedding's block signs assume this convention.
//! - `D⁻¹(W)` is the diagonal of `1 / rowsum(W)`. Rows summing to exactly zero
//!   get the mean of all row sums instead (the mean includes the zero rows),
//!   and are reported to the diagnostics sink as perturbations.
//!
//! `W` may be rectangular for `D⁻¹` (document × feature matrices are scaled by
//! their row totals).

use log::{debug, info, trace};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::{CsMat, TriMat};

use crate::diagnostics::{Diagnostics, Stage, StageTimer};
use crate::error::{Result, SupEmbError};
use crate::linalg::{from_row_major, max_asymmetry, row_sums, to_row_major};

/// `W - diag(rowsum(W))` for a dense square `W`.
pub fn laplacian(w: &DenseMatrix<f64>, diagnostics: &dyn Diagnostics) -> Result<DenseMatrix<f64>> {
    let _timer = StageTimer::start(diagnostics, Stage::Laplacian);
    let (n, cols) = w.shape();
    if n != cols {
        return Err(SupEmbError::ShapeMismatch {
            what: "column count of a square weight matrix",
            expected: n,
            found: cols,
        });
    }
    let degrees = row_sums(w);
    let mut data = to_row_major(w);
    for (i, d) in degrees.iter().enumerate() {
        data[i * n + i] -= d;
    }
    trace!("Laplacian built for {} nodes", n);
    from_row_major(n, n, data)
}

/// Sparse counterpart of [`laplacian`].
pub fn sparse_laplacian(w: &CsMat<f64>, diagnostics: &dyn Diagnostics) -> CsMat<f64> {
    let _timer = StageTimer::start(diagnostics, Stage::Laplacian);
    let (n, cols) = w.shape();
    let mut triplets = TriMat::new((n, cols));
    let mut degrees = vec![0.0; n];
    for (&v, (i, j)) in w.iter() {
        triplets.add_triplet(i, j, v);
        degrees[i] += v;
    }
    for (i, &degree) in degrees.iter().enumerate() {
        if degree != 0.0 {
            triplets.add_triplet(i, i, -degree);
        }
    }
    let l: CsMat<f64> = triplets.to_csr();
    debug!("sparse Laplacian {}x{} with {} non-zeros", n, cols, l.nnz());
    l
}

/// Diagonal of `D⁻¹(W)` together with the rows that had to be perturbed.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseDegree {
    diagonal: Vec<f64>,
    perturbed: Vec<usize>,
}

impl InverseDegree {
    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    pub fn len(&self) -> usize {
        self.diagonal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagonal.is_empty()
    }

    /// Indices of zero-sum rows that were replaced by the mean row sum.
    pub fn perturbed_rows(&self) -> &[usize] {
        &self.perturbed
    }

    /// Materialise as an `n × n` diagonal matrix.
    pub fn to_matrix(&self) -> Result<DenseMatrix<f64>> {
        let n = self.diagonal.len();
        let mut data = vec![0.0; n * n];
        for (i, &v) in self.diagonal.iter().enumerate() {
            data[i * n + i] = v;
        }
        from_row_major(n, n, data)
    }

    /// `D⁻¹ · m`: row `i` of `m` scaled by `diagonal[i]`.
    pub fn scale_rows(&self, m: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
        let (rows, cols) = m.shape();
        if rows != self.diagonal.len() {
            return Err(SupEmbError::ShapeMismatch {
                what: "row count scaled by inverse degree",
                expected: self.diagonal.len(),
                found: rows,
            });
        }
        let mut data = to_row_major(m);
        for (i, &d) in self.diagonal.iter().enumerate() {
            data[i * cols..(i + 1) * cols].iter_mut().for_each(|x| *x *= d);
        }
        from_row_major(rows, cols, data)
    }

    /// `m · D⁻¹`: column `j` of `m` scaled by `diagonal[j]`.
    pub fn scale_cols(&self, m: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
        let (rows, cols) = m.shape();
        if cols != self.diagonal.len() {
            return Err(SupEmbError::ShapeMismatch {
                what: "column count scaled by inverse degree",
                expected: self.diagonal.len(),
                found: cols,
            });
        }
        let mut data = to_row_major(m);
        for row in data.chunks_mut(cols.max(1)).take(rows) {
            row.iter_mut().zip(&self.diagonal).for_each(|(x, &d)| *x *= d);
        }
        from_row_major(rows, cols, data)
    }
}

/// `D⁻¹(W)` with the zero-degree perturbation policy.
///
/// `context` names the matrix in diagnostics (e.g. `"XlA"`).
pub fn inverse_degree(
    w: &DenseMatrix<f64>,
    context: &str,
    diagnostics: &dyn Diagnostics,
) -> InverseDegree {
    let _timer = StageTimer::start(diagnostics, Stage::InverseDegree);
    let sums = row_sums(w);
    let n = sums.len();

    let perturbed: Vec<usize> = sums
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == 0.0)
        .map(|(i, _)| i)
        .collect();

    let replacement = if n > 0 {
        let mean = sums.iter().sum::<f64>() / n as f64;
        if mean != 0.0 {
            mean
        } else {
            // every row sums to zero (or they cancel out): unit degree keeps D⁻¹ finite
            1.0
        }
    } else {
        1.0
    };

    let diagonal: Vec<f64> = sums
        .iter()
        .map(|&s| if s == 0.0 { 1.0 / replacement } else { 1.0 / s })
        .collect();

    diagnostics.perturbed_rows(context, perturbed.len(), n);
    if !perturbed.is_empty() {
        info!(
            "{}: {} zero-degree rows replaced by mean degree {:.6}",
            context,
            perturbed.len(),
            replacement
        );
    }

    InverseDegree { diagonal, perturbed }
}

/// Result of [`verify_laplacian`].
#[derive(Debug, Clone)]
pub struct LaplacianValidation {
    pub is_valid: bool,
    pub is_symmetric: bool,
    pub max_asymmetry: f64,
    pub max_row_sum_error: f64,
    pub row_sum_violations: Vec<(usize, f64)>,
}

/// Row sums ≈ 0 and symmetry within `tolerance`.
pub fn verify_laplacian(l: &DenseMatrix<f64>, tolerance: f64) -> LaplacianValidation {
    let mut row_sum_violations = Vec::new();
    let mut max_row_sum_error: f64 = 0.0;
    for (i, s) in row_sums(l).into_iter().enumerate() {
        max_row_sum_error = max_row_sum_error.max(s.abs());
        if s.abs() > tolerance {
            row_sum_violations.push((i, s));
        }
    }
    let (_, _, asymmetry) = max_asymmetry(l);
    let is_symmetric = asymmetry <= tolerance;

    let validation = LaplacianValidation {
        is_valid: row_sum_violations.is_empty() && is_symmetric,
        is_symmetric,
        max_asymmetry: asymmetry,
        max_row_sum_error,
        row_sum_violations,
    };
    debug!(
        "Laplacian validation: valid={}, symmetric={}, max row sum error={:.2e}",
        validation.is_valid, validation.is_symmetric, validation.max_row_sum_error
    );
    validation
}
