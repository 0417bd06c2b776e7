//! # Cosine similarity and k-nearest-neighbour sets
//!
//! 1. Rows are scaled to unit L2 norm. All-zero rows stay all-zero.
//! 2. `S = N · Nᵗ` over the normalised rows, clamped to `[-1, 1]`.
//! 3. For each row the `k` columns with the largest `S[i, :]` are kept. The row
//!    itself competes like any other column, so a non-zero row normally lists
//!    itself among its neighbours.
//!
//! Cost is `O(n² · f + n² log n)`: fine for one domain's instance set, not for
//! whole corpora.

use log::{debug, info, trace};
use rayon::prelude::*;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::diagnostics::{Diagnostics, Stage, StageTimer};
use crate::error::Result;
use crate::linalg::{from_row_major, to_row_major};

/// Neighbour index sets, one slot per row.
///
/// Each slot holds up to `k` row indices kept in ascending index order; the
/// order carries no similarity ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighbourSets {
    sets: Vec<Vec<usize>>,
}

impl NeighbourSets {
    pub fn new(mut sets: Vec<Vec<usize>>) -> Self {
        for s in sets.iter_mut() {
            s.sort_unstable();
            s.dedup();
        }
        Self { sets }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn neighbours(&self, row: usize) -> &[usize] {
        &self.sets[row]
    }

    /// `j` is among the neighbours of `i`.
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.sets[i].binary_search(&j).is_ok()
    }

    /// Each of `i`, `j` lists the other.
    pub fn is_mutual(&self, i: usize, j: usize) -> bool {
        self.contains(i, j) && self.contains(j, i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.sets.iter().map(|s| s.as_slice())
    }
}

/// Similarity matrix plus the neighbour sets selected from it.
#[derive(Debug, Clone)]
pub struct KnnGraph {
    pub similarity: DenseMatrix<f64>,
    pub neighbours: NeighbourSets,
    /// `k` after clipping to the number of rows.
    pub k: usize,
}

/// Scale every row to unit L2 norm; zero rows are returned unchanged.
pub fn normalise_rows(m: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    let (rows, cols) = m.shape();
    let mut data = to_row_major(m);
    let mut zero_rows = 0usize;
    for row in data.chunks_mut(cols.max(1)).take(rows) {
        let norm = row.iter().map(|&x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            row.iter_mut().for_each(|x| *x /= norm);
        } else {
            zero_rows += 1;
        }
    }
    if zero_rows > 0 {
        debug!("normalise_rows: {} all-zero rows left as-is", zero_rows);
    }
    from_row_major(rows, cols, data)
}

/// Pairwise cosine similarity between rows, `n × n`.
pub fn cosine_similarity(m: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
    let (n, f) = m.shape();
    let normed = to_row_major(&normalise_rows(m)?);

    // Upper triangle only, mirrored below, so S is exactly symmetric.
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let a = &normed[i * f..(i + 1) * f];
            (i..n)
                .map(|j| {
                    let b = &normed[j * f..(j + 1) * f];
                    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                    dot.clamp(-1.0, 1.0)
                })
                .collect()
        })
        .collect();

    let mut data = vec![0.0; n * n];
    for (i, row) in upper.iter().enumerate() {
        for (offset, &s) in row.iter().enumerate() {
            let j = i + offset;
            data[i * n + j] = s;
            data[j * n + i] = s;
        }
    }
    from_row_major(n, n, data)
}

/// Top-`k` columns of one similarity row.
///
/// Columns are ordered by ascending similarity with a stable sort and the last
/// `k` are taken, so among equal scores the higher column index wins.
fn top_k(row: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| {
        row[a]
            .partial_cmp(&row[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.split_off(row.len() - k)
}

/// Normalise rows, compute cosine similarity and pick `k` neighbours per row.
///
/// `k` larger than the number of rows is clipped: every row then lists all rows.
pub fn knn(m: &DenseMatrix<f64>, k: usize, diagnostics: &dyn Diagnostics) -> Result<KnnGraph> {
    let _timer = StageTimer::start(diagnostics, Stage::Knn);
    let (n, f) = m.shape();
    info!("Computing {}-NN over {} rows with {} features", k, n, f);

    let similarity = cosine_similarity(m)?;
    let k_eff = k.min(n);
    if k_eff < k {
        debug!("k={} clipped to {} rows", k, k_eff);
    }

    let sims = to_row_major(&similarity);
    let sets: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| top_k(&sims[i * n..(i + 1) * n], k_eff))
        .collect();
    trace!("neighbour sets built for {} rows", sets.len());

    Ok(KnnGraph {
        similarity,
        neighbours: NeighbourSets::new(sets),
        k: k_eff,
    })
}
