//! Dense helpers over `smartcore::DenseMatrix<f64>`.
//!
//! Dense products go through nalgebra (`DMatrix`) and come back as smartcore
//! matrices; the sparse product walks the CSR entries. Everything else is
//! plain element access through the smartcore `Array` traits.

use log::trace;
use nalgebra::DMatrix;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::CsMat;

use crate::error::{Result, SupEmbError};

/// Build a matrix from a row-major buffer.
pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Result<DenseMatrix<f64>> {
    if data.len() != rows * cols {
        return Err(SupEmbError::ShapeMismatch {
            what: "row-major buffer length",
            expected: rows * cols,
            found: data.len(),
        });
    }
    Ok(DenseMatrix::new(rows, cols, data, false)?)
}

/// Build a matrix from rows; all rows must have the same length.
pub fn from_rows(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let n = rows.len();
    let f = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut data = Vec::with_capacity(n * f);
    for row in rows {
        if row.len() != f {
            return Err(SupEmbError::ShapeMismatch {
                what: "row length",
                expected: f,
                found: row.len(),
            });
        }
        data.extend_from_slice(row);
    }
    from_row_major(n, f, data)
}

/// Copy a matrix into a row-major buffer.
pub fn to_row_major(m: &DenseMatrix<f64>) -> Vec<f64> {
    let (rows, cols) = m.shape();
    let mut out = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            out.push(*m.get((i, j)));
        }
    }
    out
}

pub fn row_sums(m: &DenseMatrix<f64>) -> Vec<f64> {
    let (rows, cols) = m.shape();
    (0..rows)
        .map(|i| (0..cols).map(|j| *m.get((i, j))).sum())
        .collect()
}

/// Copy into an nalgebra matrix.
pub fn to_nalgebra(m: &DenseMatrix<f64>) -> DMatrix<f64> {
    let (rows, cols) = m.shape();
    DMatrix::from_fn(rows, cols, |i, j| *m.get((i, j)))
}

/// Copy an nalgebra matrix back into the crate's dense type.
pub fn from_nalgebra(m: &DMatrix<f64>) -> Result<DenseMatrix<f64>> {
    let (rows, cols) = m.shape();
    // nalgebra stores column-major
    Ok(DenseMatrix::new(rows, cols, m.as_slice().to_vec(), true)?)
}

fn check_inner(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(SupEmbError::ShapeMismatch { what, expected, found });
    }
    Ok(())
}

/// `a · b`
pub fn matmul(a: &DenseMatrix<f64>, b: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    let (n, k) = a.shape();
    let (k2, m) = b.shape();
    check_inner("inner dimension of matrix product", k, k2)?;
    trace!("matmul {}x{} * {}x{}", n, k, k2, m);
    from_nalgebra(&(to_nalgebra(a) * to_nalgebra(b)))
}

/// `aᵗ · b`
pub fn transpose_matmul(a: &DenseMatrix<f64>, b: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    check_inner("row count of transposed product", a.shape().0, b.shape().0)?;
    from_nalgebra(&to_nalgebra(a).tr_mul(&to_nalgebra(b)))
}

/// `s · b` for a sparse CSR/CSC left operand.
pub fn sparse_matmul(s: &CsMat<f64>, b: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    let (n, k) = s.shape();
    let (k2, m) = b.shape();
    check_inner("inner dimension of sparse product", k, k2)?;
    let rhs = to_row_major(b);
    let mut out = vec![0.0; n * m];
    for (&v, (i, p)) in s.iter() {
        let rhs_row = &rhs[p * m..(p + 1) * m];
        let out_row = &mut out[i * m..(i + 1) * m];
        for (o, &r) in out_row.iter_mut().zip(rhs_row) {
            *o += v * r;
        }
    }
    from_row_major(n, m, out)
}

/// `pᵗ · l · p`
pub fn quadratic_form(p: &DenseMatrix<f64>, l: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    let (rows, cols) = l.shape();
    check_inner("column count of the quadratic form's matrix", rows, cols)?;
    check_inner("row count of the quadratic form's basis", rows, p.shape().0)?;
    let p = to_nalgebra(p);
    from_nalgebra(&p.tr_mul(&(to_nalgebra(l) * &p)))
}

/// `[top; bottom]`
pub fn vstack(top: &DenseMatrix<f64>, bottom: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    let (r1, c1) = top.shape();
    let (r2, c2) = bottom.shape();
    if c1 != c2 {
        return Err(SupEmbError::ShapeMismatch {
            what: "column count of vertically stacked blocks",
            expected: c1,
            found: c2,
        });
    }
    let mut data = to_row_major(top);
    data.extend(to_row_major(bottom));
    from_row_major(r1 + r2, c1, data)
}

/// `[left, right]`
pub fn hstack(left: &DenseMatrix<f64>, right: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    let (r1, c1) = left.shape();
    let (r2, c2) = right.shape();
    if r1 != r2 {
        return Err(SupEmbError::ShapeMismatch {
            what: "row count of horizontally stacked blocks",
            expected: r1,
            found: r2,
        });
    }
    let mut data = Vec::with_capacity(r1 * (c1 + c2));
    for i in 0..r1 {
        data.extend((0..c1).map(|j| *left.get((i, j))));
        data.extend((0..c2).map(|j| *right.get((i, j))));
    }
    from_row_major(r1, c1 + c2, data)
}

/// `[[a, 0], [0, b]]`
pub fn block_diagonal(a: &DenseMatrix<f64>, b: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    let (ra, ca) = a.shape();
    let (rb, cb) = b.shape();
    let cols = ca + cb;
    let mut data = vec![0.0; (ra + rb) * cols];
    for i in 0..ra {
        for j in 0..ca {
            data[i * cols + j] = *a.get((i, j));
        }
    }
    for i in 0..rb {
        for j in 0..cb {
            data[(ra + i) * cols + ca + j] = *b.get((i, j));
        }
    }
    from_row_major(ra + rb, cols, data)
}

/// Rows `start..end` of `m`.
pub fn row_slice(m: &DenseMatrix<f64>, start: usize, end: usize) -> Result<DenseMatrix<f64>> {
    let (rows, cols) = m.shape();
    if end > rows || start > end {
        return Err(SupEmbError::ShapeMismatch {
            what: "row slice end",
            expected: rows,
            found: end,
        });
    }
    let mut data = Vec::with_capacity((end - start) * cols);
    for i in start..end {
        data.extend((0..cols).map(|j| *m.get((i, j))));
    }
    from_row_major(end - start, cols, data)
}

/// Largest `|m[i,j] - m[j,i]|` and where it occurs.
pub fn max_asymmetry(m: &DenseMatrix<f64>) -> (usize, usize, f64) {
    let (n, _) = m.shape();
    let mut worst = (0, 0, 0.0f64);
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = (m.get((i, j)) - m.get((j, i))).abs();
            if diff > worst.2 {
                worst = (i, j, diff);
            }
        }
    }
    worst
}

/// Symmetry check with an absolute tolerance. Non-square input is a shape error.
pub fn check_symmetry(m: &DenseMatrix<f64>, tolerance: f64) -> Result<()> {
    let (rows, cols) = m.shape();
    if rows != cols {
        return Err(SupEmbError::ShapeMismatch {
            what: "column count of a square matrix",
            expected: rows,
            found: cols,
        });
    }
    let (row, col, deviation) = max_asymmetry(m);
    if deviation > tolerance {
        return Err(SupEmbError::Asymmetric { row, col, deviation });
    }
    Ok(())
}
