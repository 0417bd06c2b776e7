//! # Weight graphs for the three embedding rules
//!
//! - **Rule 1** ([`structural_graph`]): `[[0, I], [I, 0]]` linking pivot `i` of
//!   the source domain to pivot `i` of the target domain. Sparse, 2M non-zeros.
//! - **Rule 2** ([`labelled_graph`]): mutual k-NN pairs over the labeled source
//!   documents. Same-label pairs weigh `-λ₂ · S[i,j]`, different-label pairs
//!   weigh `+S[i,j]`.
//! - **Rule 3** ([`unlabelled_graph`]): the raw similarity matrix of the
//!   unlabeled documents of one domain. Neighbour sets are computed but do not
//!   mask the weights.
//!
//! DESIGN.md records the sign convention of Rule 2 and the unmasked Rule 3.

use std::fmt;

use log::{debug, info, trace};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::{CsMat, TriMat};

use crate::diagnostics::{Diagnostics, Stage, StageTimer};
use crate::error::{Result, SupEmbError};
use crate::linalg::{from_row_major, max_asymmetry, to_row_major};
use crate::similarity::knn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphRule {
    Labelled,
    Unlabelled,
}

/// Dense weight matrix produced by Rule 2 or Rule 3.
#[derive(Debug, Clone)]
pub struct WeightGraph {
    pub matrix: DenseMatrix<f64>,
    pub nnodes: usize,
    pub rule: GraphRule,
    /// Effective neighbourhood size used while building the graph.
    pub k: usize,
}

impl WeightGraph {
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        *self.matrix.get((i, j))
    }

    pub fn nnz(&self) -> usize {
        let mut count = 0;
        for i in 0..self.nnodes {
            for j in 0..self.nnodes {
                if self.matrix.get((i, j)).abs() > 1e-15 {
                    count += 1;
                }
            }
        }
        count
    }

    /// Fraction of zero entries.
    pub fn sparsity(&self) -> f64 {
        let total = self.nnodes * self.nnodes;
        if total == 0 {
            return 1.0;
        }
        (total - self.nnz()) as f64 / total as f64
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let (_, _, deviation) = max_asymmetry(&self.matrix);
        trace!("weight graph max asymmetry {:.2e}", deviation);
        deviation <= tolerance
    }
}

impl fmt::Display for WeightGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "WeightGraph {:?} ({}×{}, k={}):", self.rule, self.nnodes, self.nnodes, self.k)?;
        if self.nnodes <= 10 {
            for i in 0..self.nnodes {
                write!(f, "Row {}: [", i)?;
                for j in 0..self.nnodes {
                    write!(f, "{:8.4} ", self.matrix.get((i, j)))?;
                }
                writeln!(f, "]")?;
            }
        } else {
            writeln!(
                f,
                "Non-zero entries: {} ({:.2}% dense)",
                self.nnz(),
                (1.0 - self.sparsity()) * 100.0
            )?;
        }
        Ok(())
    }
}

/// Rule 1: `2M × 2M` matrix `[[0, I], [I, 0]]`.
pub fn structural_graph(m: usize, diagnostics: &dyn Diagnostics) -> CsMat<f64> {
    let _timer = StageTimer::start(diagnostics, Stage::StructuralGraph);
    let mut triplets = TriMat::new((2 * m, 2 * m));
    for i in 0..m {
        triplets.add_triplet(i, m + i, 1.0);
        triplets.add_triplet(m + i, i, 1.0);
    }
    let w1: CsMat<f64> = triplets.to_csr();
    debug!("W1 {}x{} with {} non-zeros", 2 * m, 2 * m, w1.nnz());
    w1
}

/// Rule 2: mutual-neighbour graph over the labeled source documents.
///
/// `labels[i]` is the ±1 label of row `i` of `labelled`.
pub fn labelled_graph(
    labelled: &DenseMatrix<f64>,
    labels: &[i32],
    k: usize,
    lambda_2: f64,
    diagnostics: &dyn Diagnostics,
) -> Result<WeightGraph> {
    let (n, _) = labelled.shape();
    if labels.len() != n {
        return Err(SupEmbError::ShapeMismatch {
            what: "label count of labeled documents",
            expected: n,
            found: labels.len(),
        });
    }

    let graph = knn(labelled, k, diagnostics)?;
    let _timer = StageTimer::start(diagnostics, Stage::LabelledGraph);
    info!("Building W2 over {} labeled documents (k={}, lambda_2={})", n, graph.k, lambda_2);

    let sims = to_row_major(&graph.similarity);
    let mut data = vec![0.0; n * n];
    let mut same_label = 0usize;
    let mut cross_label = 0usize;
    for i in 0..n {
        for &j in graph.neighbours.neighbours(i) {
            if !graph.neighbours.contains(j, i) {
                continue;
            }
            let s = sims[i * n + j];
            if labels[i] == labels[j] {
                data[i * n + j] = -lambda_2 * s;
                same_label += 1;
            } else {
                data[i * n + j] = s;
                cross_label += 1;
            }
        }
    }
    debug!(
        "W2 mutual pairs: {} same-label, {} cross-label (directed, self pairs included)",
        same_label, cross_label
    );

    Ok(WeightGraph {
        matrix: from_row_major(n, n, data)?,
        nnodes: n,
        rule: GraphRule::Labelled,
        k: graph.k,
    })
}

/// Rule 3: similarity graph over the unlabeled documents of one domain.
///
/// Every entry is the raw cosine similarity, whether or not the pair are
/// neighbours.
pub fn unlabelled_graph(
    unlabelled: &DenseMatrix<f64>,
    k: usize,
    diagnostics: &dyn Diagnostics,
) -> Result<WeightGraph> {
    let (n, _) = unlabelled.shape();
    let graph = knn(unlabelled, k, diagnostics)?;
    let _timer = StageTimer::start(diagnostics, Stage::UnlabelledGraph);
    info!("Building W3 over {} unlabeled documents (k={})", n, graph.k);

    let outside_neighbourhood: usize = (0..n)
        .map(|i| n - graph.neighbours.neighbours(i).len())
        .sum();
    debug!(
        "W3 keeps {} weighted pairs outside the {}-NN sets",
        outside_neighbourhood, graph.k
    );

    Ok(WeightGraph {
        matrix: graph.similarity,
        nnodes: n,
        rule: GraphRule::Unlabelled,
        k: graph.k,
    })
}
