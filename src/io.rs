//! MatrixMarket persistence.
//!
//! Coordinate files are read with `sprs` (general or symmetric, duplicate
//! entries summed) and densified. Dense `array` files, as written by scipy's
//! `mmwrite` for a dense matrix, are parsed here: a `rows cols` size line then
//! the values in column-major order, only the lower triangle for symmetric and
//! skew-symmetric storage. Writing emits the coordinate layout with the
//! non-zero entries only, so a round trip reproduces every `(row, col, value)`
//! triple.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::io::{read_matrix_market, write_matrix_market};
use sprs::{CsMat, TriMat};

use crate::diagnostics::{Diagnostics, Stage, StageTimer};
use crate::error::{Result, SupEmbError};
use crate::linalg::from_row_major;

/// Sparse copy of a dense matrix, zeros dropped.
pub fn to_sparse(m: &DenseMatrix<f64>) -> CsMat<f64> {
    let (rows, cols) = m.shape();
    let mut triplets = TriMat::new((rows, cols));
    for i in 0..rows {
        for j in 0..cols {
            let v = *m.get((i, j));
            if v != 0.0 {
                triplets.add_triplet(i, j, v);
            }
        }
    }
    triplets.to_csr()
}

/// Dense copy of a sparse matrix.
pub fn to_dense(s: &CsMat<f64>) -> Result<DenseMatrix<f64>> {
    let (rows, cols) = s.shape();
    let mut data = vec![0.0; rows * cols];
    for (&v, (i, j)) in s.iter() {
        data[i * cols + j] += v;
    }
    from_row_major(rows, cols, data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArraySymmetry {
    General,
    Symmetric,
    SkewSymmetric,
}

/// Storage of a dense `array` file; `None` for anything else (left to sprs).
fn array_layout(path: &Path) -> Option<std::result::Result<ArraySymmetry, String>> {
    let file = File::open(path).ok()?;
    let mut header = String::new();
    BufReader::new(file).read_line(&mut header).ok()?;
    let tokens: Vec<String> = header
        .split_whitespace()
        .map(|t| t.to_ascii_lowercase())
        .collect();
    if tokens.len() < 5 || tokens[0] != "%%matrixmarket" || tokens[2] != "array" {
        return None;
    }
    Some(match (tokens[3].as_str(), tokens[4].as_str()) {
        ("real" | "double" | "integer", "general") => Ok(ArraySymmetry::General),
        ("real" | "double" | "integer", "symmetric") => Ok(ArraySymmetry::Symmetric),
        ("real" | "double" | "integer", "skew-symmetric") => Ok(ArraySymmetry::SkewSymmetric),
        (field, symmetry) => Err(format!("unsupported array storage: {} {}", field, symmetry)),
    })
}

fn read_array(path: &Path, symmetry: ArraySymmetry) -> Result<DenseMatrix<f64>> {
    let parse_err = |reason: String| SupEmbError::MatrixParse {
        path: path.to_path_buf(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|e| parse_err(e.to_string()))?;
    let mut lines = text
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('%'));

    let size = lines
        .next()
        .ok_or_else(|| parse_err("missing size line".to_string()))?;
    let dims: Vec<usize> = size
        .split_whitespace()
        .map(|t| t.parse::<usize>())
        .collect::<std::result::Result<Vec<usize>, _>>()
        .map_err(|e| parse_err(format!("bad size line {:?}: {}", size, e)))?;
    let (rows, cols) = match dims.as_slice() {
        [rows, cols] => (*rows, *cols),
        _ => return Err(parse_err(format!("bad size line {:?}", size))),
    };
    if symmetry != ArraySymmetry::General && rows != cols {
        return Err(parse_err(format!("{:?} storage of a {} x {} matrix", symmetry, rows, cols)));
    }

    let values: Vec<f64> = lines
        .flat_map(str::split_whitespace)
        .map(|t| {
            t.parse::<f64>()
                .map_err(|e| parse_err(format!("bad value {:?}: {}", t, e)))
        })
        .collect::<Result<_>>()?;

    // column-major; symmetric storages keep the lower triangle only
    let mut slots = Vec::with_capacity(rows * cols);
    for j in 0..cols {
        let start = match symmetry {
            ArraySymmetry::General => 0,
            ArraySymmetry::Symmetric => j,
            ArraySymmetry::SkewSymmetric => j + 1,
        };
        slots.extend((start..rows).map(|i| (i, j)));
    }
    if values.len() != slots.len() {
        return Err(parse_err(format!(
            "expected {} values, found {}",
            slots.len(),
            values.len()
        )));
    }

    let mut data = vec![0.0; rows * cols];
    for (&(i, j), &v) in slots.iter().zip(&values) {
        data[i * cols + j] = v;
        if i != j {
            match symmetry {
                ArraySymmetry::General => {}
                ArraySymmetry::Symmetric => data[j * cols + i] = v,
                ArraySymmetry::SkewSymmetric => data[j * cols + i] = -v,
            }
        }
    }
    from_row_major(rows, cols, data)
}

/// Read a MatrixMarket file (`coordinate` or `array` layout) into a dense matrix.
pub fn load_matrix<P: AsRef<Path>>(path: P, diagnostics: &dyn Diagnostics) -> Result<DenseMatrix<f64>> {
    let path = path.as_ref();
    let _timer = StageTimer::start(diagnostics, Stage::MatrixIo);
    debug!("Loading matrix from {}", path.display());

    if let Some(layout) = array_layout(path) {
        let symmetry = layout.map_err(|reason| SupEmbError::MatrixParse {
            path: path.to_path_buf(),
            reason,
        })?;
        let dense = read_array(path, symmetry)?;
        let (rows, cols) = dense.shape();
        info!("Loaded {} ({} x {}, dense {:?} array)", path.display(), rows, cols, symmetry);
        return Ok(dense);
    }

    let triplets: TriMat<f64> =
        read_matrix_market::<f64, usize, _>(path).map_err(|source| SupEmbError::MatrixRead {
            path: path.to_path_buf(),
            source,
        })?;
    let sparse: CsMat<f64> = triplets.to_csr();
    let dense = to_dense(&sparse)?;
    let (rows, cols) = dense.shape();
    info!("Loaded {} ({} x {}, {} non-zeros)", path.display(), rows, cols, sparse.nnz());
    Ok(dense)
}

/// Write a dense matrix as a MatrixMarket coordinate file.
pub fn save_matrix<P: AsRef<Path>>(
    path: P,
    m: &DenseMatrix<f64>,
    diagnostics: &dyn Diagnostics,
) -> Result<()> {
    let path = path.as_ref();
    let _timer = StageTimer::start(diagnostics, Stage::MatrixIo);
    let sparse = to_sparse(m);
    write_matrix_market(path, &sparse).map_err(|source| SupEmbError::MatrixWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "Saved {} x {} matrix ({} non-zeros) to {}",
        sparse.rows(),
        sparse.cols(),
        sparse.nnz(),
        path.display()
    );
    Ok(())
}
