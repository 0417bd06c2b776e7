//! # Projector and instance projector
//!
//! The joint matrix Q is decomposed with a full SVD (nalgebra) and the left
//! singular vectors of the `dims` largest singular values are kept, giving
//! `U` of shape `(d + h) × dims`. Its first `d` rows form `Pa` (`d × dims`),
//! the remaining `h` rows form `Pb` (`h × dims`).
//!
//! Documents are projected with
//!
//! ```text
//! Y = Xᵗ · D⁻¹(X)
//! Z = [(U·P)ᵗ, (A·P)ᵗ]        (dims × (M + rA))
//! out = (Z · Y)ᵗ              (n × dims)
//! ```

use log::{debug, info, trace};
use nalgebra::SVD;
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::builder::EmbeddingParams;
use crate::diagnostics::{Diagnostics, Stage, StageTimer};
use crate::error::{Result, SupEmbError};
use crate::laplacian::inverse_degree;
use crate::linalg::{from_row_major, hstack, matmul, row_slice, to_nalgebra};

/// Source/target projection matrices.
#[derive(Debug, Clone)]
pub struct Projection {
    /// `d × dims`
    pub pa: DenseMatrix<f64>,
    /// `h × dims`
    pub pb: DenseMatrix<f64>,
    /// Retained singular values, descending.
    pub singular_values: Vec<f64>,
}

impl Projection {
    pub fn dims(&self) -> usize {
        self.singular_values.len()
    }
}

/// Left singular vectors of the `dims` largest singular values of square `q`.
///
/// Returns `U` (`n × dims`) and the singular values in descending order.
pub fn truncated_svd(
    q: &DenseMatrix<f64>,
    dims: usize,
    eps: f64,
    max_iterations: usize,
    diagnostics: &dyn Diagnostics,
) -> Result<(DenseMatrix<f64>, Vec<f64>)> {
    let (n, cols) = q.shape();
    if n != cols {
        return Err(SupEmbError::ShapeMismatch {
            what: "column count of the matrix to decompose",
            expected: n,
            found: cols,
        });
    }
    if dims == 0 || dims >= n {
        return Err(SupEmbError::InfeasibleRank { dims, order: n });
    }

    let _timer = StageTimer::start(diagnostics, Stage::Svd);
    info!("Dimensionality of Q: {} x {}", n, n);
    let matrix = to_nalgebra(q);
    let svd = SVD::try_new(matrix, true, false, eps, max_iterations).ok_or(
        SupEmbError::SvdNonConvergence { order: n, max_iterations },
    )?;
    let u = svd
        .u
        .ok_or_else(|| SupEmbError::Linalg("SVD did not return left singular vectors".into()))?;

    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&a, &b| {
        svd.singular_values[b]
            .partial_cmp(&svd.singular_values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(dims);

    let singular_values: Vec<f64> = order.iter().map(|&c| svd.singular_values[c]).collect();
    debug!(
        "retained singular values: largest={:.6}, smallest={:.6}",
        singular_values.first().copied().unwrap_or(0.0),
        singular_values.last().copied().unwrap_or(0.0)
    );

    let mut data = Vec::with_capacity(n * dims);
    for i in 0..n {
        data.extend(order.iter().map(|&c| u[(i, c)]));
    }
    Ok((from_row_major(n, dims, data)?, singular_values))
}

/// Split the `(d + h) × dims` singular vectors into `Pa` and `Pb`.
pub fn split_projection(
    u: &DenseMatrix<f64>,
    d: usize,
    singular_values: Vec<f64>,
    diagnostics: &dyn Diagnostics,
) -> Result<Projection> {
    let (n, dims) = u.shape();
    if d >= n {
        return Err(SupEmbError::ShapeMismatch {
            what: "source dimension smaller than joint dimension",
            expected: n,
            found: d,
        });
    }
    let pa = row_slice(u, 0, d)?;
    let pb = row_slice(u, d, n)?;
    diagnostics.shape("Pa", d, dims);
    diagnostics.shape("Pb", n - d, dims);
    Ok(Projection { pa, pb, singular_values })
}

/// Decompose `q` and split into the two domain projections.
pub fn project(
    q: &DenseMatrix<f64>,
    d: usize,
    params: &EmbeddingParams,
    diagnostics: &dyn Diagnostics,
) -> Result<Projection> {
    let (u, singular_values) = truncated_svd(
        q,
        params.dims,
        params.svd_eps,
        params.svd_max_iterations,
        diagnostics,
    )?;
    split_projection(&u, d, singular_values, diagnostics)
}

/// Map documents into the joint space.
///
/// - `documents`: `n × (M + r)` raw document vectors
/// - `pivots`: `M × f` pivot matrix of the documents' domain
/// - `domain`: `r × f` domain feature matrix
/// - `projection`: `f × dims` (`Pa` or `Pb`)
pub fn project_instances(
    documents: &DenseMatrix<f64>,
    pivots: &DenseMatrix<f64>,
    domain: &DenseMatrix<f64>,
    projection: &DenseMatrix<f64>,
    diagnostics: &dyn Diagnostics,
) -> Result<DenseMatrix<f64>> {
    let (n, cols) = documents.shape();
    let expected = pivots.shape().0 + domain.shape().0;
    if cols != expected {
        return Err(SupEmbError::ShapeMismatch {
            what: "document columns (pivot rows + domain rows)",
            expected,
            found: cols,
        });
    }

    let degree = inverse_degree(documents, "projected documents", diagnostics);
    let _timer = StageTimer::start(diagnostics, Stage::InstanceProjection);
    let y = degree.scale_cols(&documents.transpose())?;
    let left = matmul(pivots, projection)?;
    let right = matmul(domain, projection)?;
    let z = hstack(&left.transpose(), &right.transpose())?;
    let projected = matmul(&z, &y)?.transpose();
    trace!("projected {} documents into {} dims", n, projected.shape().1);
    Ok(projected)
}
