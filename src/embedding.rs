//! # Joint embedding assembler
//!
//! Inputs (rows × cols):
//!
//! | matrix | shape | role |
//! |---|---|---|
//! | `ua` | M × d | source pivot features |
//! | `ub` | M × h | target pivot features |
//! | `a` | rA × d | source domain features |
//! | `b` | rB × h | target domain features |
//! | `xla_pos`, `xla_neg` | n± × (M + rA) | labeled source documents |
//! | `xua` | nA × (M + rA) | unlabeled source documents |
//! | `xub` | nB × (M + rB) | unlabeled target documents |
//!
//! The joint matrix is
//!
//! ```text
//! Q = [[ w2·F2 − w3·F3 , 0            ],
//!      [ 0             , −w3·λ₂·F3'   ]] − U1ᵗ·L(W1)·U1
//! ```
//!
//! with `Fx = (D⁻¹(X)·X·tot)ᵗ · L(Wx) · (D⁻¹(X)·X·tot)` and `tot = [U; A]`
//! (resp. `[Ub; B]`). Q is `(d + h) × (d + h)` and symmetric up to rounding.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::CsMat;

use crate::builder::EmbeddingParams;
use crate::diagnostics::{Diagnostics, Stage, StageTimer};
use crate::error::{Result, SupEmbError};
use crate::graph::{labelled_graph, structural_graph, unlabelled_graph, WeightGraph};
use crate::io::{load_matrix, save_matrix};
use crate::laplacian::{inverse_degree, laplacian, sparse_laplacian};
use crate::linalg::{
    block_diagonal, check_symmetry, from_row_major, matmul, quadratic_form, sparse_matmul,
    transpose_matmul, vstack,
};
use crate::projection::{project, project_instances, Projection};

/// Absolute tolerance used by the debug-build symmetry check on Q.
pub const SYMMETRY_TOLERANCE: f64 = 1e-6;

/// The eight input matrices of one source/target pair.
#[derive(Debug, Clone)]
pub struct DomainInputs {
    pub ua: DenseMatrix<f64>,
    pub ub: DenseMatrix<f64>,
    pub a: DenseMatrix<f64>,
    pub b: DenseMatrix<f64>,
    pub xla_pos: DenseMatrix<f64>,
    pub xla_neg: DenseMatrix<f64>,
    pub xua: DenseMatrix<f64>,
    pub xub: DenseMatrix<f64>,
}

fn non_empty(what: &'static str, m: &DenseMatrix<f64>) -> Result<()> {
    let (rows, cols) = m.shape();
    if rows == 0 || cols == 0 {
        return Err(SupEmbError::EmptyMatrix { what });
    }
    Ok(())
}

fn expect_eq(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(SupEmbError::ShapeMismatch { what, expected, found });
    }
    Ok(())
}

impl DomainInputs {
    /// Shape preconditions. Any violation is fatal and checked before any
    /// computation.
    pub fn validate(&self) -> Result<()> {
        non_empty("Ua", &self.ua)?;
        non_empty("Ub", &self.ub)?;
        non_empty("A", &self.a)?;
        non_empty("B", &self.b)?;
        non_empty("XlA_pos", &self.xla_pos)?;
        non_empty("XlA_neg", &self.xla_neg)?;
        non_empty("XuA", &self.xua)?;
        non_empty("XuB", &self.xub)?;

        let (m, d) = self.ua.shape();
        let (mb, h) = self.ub.shape();
        let (ra, a_cols) = self.a.shape();
        let (rb, b_cols) = self.b.shape();

        expect_eq("Ub rows (pivot count of Ua)", m, mb)?;
        expect_eq("B columns (columns of Ub)", h, b_cols)?;
        expect_eq("A columns (columns of Ua)", d, a_cols)?;
        expect_eq(
            "XlA_neg columns (columns of XlA_pos)",
            self.xla_pos.shape().1,
            self.xla_neg.shape().1,
        )?;
        expect_eq("XuA columns (Ua rows + A rows)", m + ra, self.xua.shape().1)?;
        expect_eq("XuB columns (Ub rows + B rows)", mb + rb, self.xub.shape().1)?;
        expect_eq("XlA_pos columns (Ua rows + A rows)", m + ra, self.xla_pos.shape().1)?;
        Ok(())
    }
}

/// Supervised cross-domain embedding over one validated input set.
pub struct SupEmb {
    inputs: DomainInputs,
    /// `[XlA_pos; XlA_neg]`
    labelled: DenseMatrix<f64>,
    labels: Vec<i32>,
    params: EmbeddingParams,
    diagnostics: Arc<dyn Diagnostics>,
    m: usize,
    d: usize,
    h: usize,
}

impl SupEmb {
    pub fn new(
        inputs: DomainInputs,
        params: EmbeddingParams,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self> {
        for (name, matrix) in [
            ("Ua", &inputs.ua),
            ("Ub", &inputs.ub),
            ("A", &inputs.a),
            ("B", &inputs.b),
            ("XlA_pos", &inputs.xla_pos),
            ("XlA_neg", &inputs.xla_neg),
            ("XuA", &inputs.xua),
            ("XuB", &inputs.xub),
        ] {
            let (rows, cols) = matrix.shape();
            diagnostics.shape(name, rows, cols);
        }
        inputs.validate()?;

        let (m, d) = inputs.ua.shape();
        let h = inputs.ub.shape().1;
        let pos_n = inputs.xla_pos.shape().0;
        let neg_n = inputs.xla_neg.shape().0;

        let labelled = vstack(&inputs.xla_pos, &inputs.xla_neg)?;
        let labels: Vec<i32> = std::iter::repeat(1)
            .take(pos_n)
            .chain(std::iter::repeat(-1).take(neg_n))
            .collect();

        info!(
            "SupEmb ready: M={} pivots, d={}, h={}, {} positive / {} negative labeled documents",
            m, d, h, pos_n, neg_n
        );
        debug!("Parameters: {:?}", params);

        Ok(Self { inputs, labelled, labels, params, diagnostics, m, d, h })
    }

    pub fn params(&self) -> &EmbeddingParams {
        &self.params
    }

    pub fn inputs(&self) -> &DomainInputs {
        &self.inputs
    }

    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    /// Number of shared pivot features.
    pub fn pivots(&self) -> usize {
        self.m
    }

    /// Source feature-space dimension.
    pub fn source_dim(&self) -> usize {
        self.d
    }

    /// Target feature-space dimension.
    pub fn target_dim(&self) -> usize {
        self.h
    }

    /// Combined labeled source documents, positives first.
    pub fn labelled(&self) -> &DenseMatrix<f64> {
        &self.labelled
    }

    /// `+1` for each positive row of [`Self::labelled`], `-1` for each negative.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Rule 1 graph over the 2M pivots.
    pub fn structural_graph(&self) -> CsMat<f64> {
        structural_graph(self.m, self.diagnostics())
    }

    /// Rule 2 graph over the labeled source documents.
    pub fn labelled_graph(&self) -> Result<WeightGraph> {
        labelled_graph(
            &self.labelled,
            &self.labels,
            self.params.k2,
            self.params.lambda_2,
            self.diagnostics(),
        )
    }

    /// Rule 3 graph over the unlabeled source documents.
    pub fn source_unlabelled_graph(&self) -> Result<WeightGraph> {
        unlabelled_graph(&self.inputs.xua, self.params.k3, self.diagnostics())
    }

    /// Rule 3 graph over the unlabeled target documents.
    pub fn target_unlabelled_graph(&self) -> Result<WeightGraph> {
        unlabelled_graph(&self.inputs.xub, self.params.k3_bar, self.diagnostics())
    }

    /// `U1 = [[Ua, 0], [0, Ub]]`, `2M × (d + h)`.
    pub fn pivot_blocks(&self) -> Result<DenseMatrix<f64>> {
        block_diagonal(&self.inputs.ua, &self.inputs.ub)
    }

    /// `U1ᵗ · L(W1) · U1`
    pub fn structural_term(&self) -> Result<DenseMatrix<f64>> {
        info!("Rule1");
        let w1 = self.structural_graph();
        let l1 = sparse_laplacian(&w1, self.diagnostics());
        let u1 = self.pivot_blocks()?;
        let _timer = StageTimer::start(self.diagnostics(), Stage::StructuralTerm);
        info!("Computing U1.T * L(W1) * U1");
        let l1_u1 = sparse_matmul(&l1, &u1)?;
        transpose_matmul(&u1, &l1_u1)
    }

    /// `(D⁻¹(X)·X·tot)ᵗ · L(W) · (D⁻¹(X)·X·tot)`
    fn neighbourhood_term(
        &self,
        documents: &DenseMatrix<f64>,
        context: &str,
        tot: &DenseMatrix<f64>,
        weights: &WeightGraph,
    ) -> Result<DenseMatrix<f64>> {
        let l = laplacian(&weights.matrix, self.diagnostics())?;
        let degree = inverse_degree(documents, context, self.diagnostics());
        let scaled = degree.scale_rows(documents)?;
        let part = matmul(&scaled, tot)?;
        debug!("{} part {} x {}", context, part.shape().0, part.shape().1);
        quadratic_form(&part, &l)
    }

    /// Rule 2 term F2, `d × d`.
    pub fn labelled_term(&self) -> Result<DenseMatrix<f64>> {
        info!("Rule2");
        let w2 = self.labelled_graph()?;
        let tot_a = vstack(&self.inputs.ua, &self.inputs.a)?;
        info!("Computing F2");
        self.neighbourhood_term(&self.labelled, "XlA", &tot_a, &w2)
    }

    /// Rule 3 source term F3, `d × d`.
    pub fn source_unlabelled_term(&self) -> Result<DenseMatrix<f64>> {
        info!("Rule3");
        let w3 = self.source_unlabelled_graph()?;
        let tot_a = vstack(&self.inputs.ua, &self.inputs.a)?;
        info!("Computing F3");
        self.neighbourhood_term(&self.inputs.xua, "XuA", &tot_a, &w3)
    }

    /// Rule 3 target term F3', `h × h`.
    pub fn target_unlabelled_term(&self) -> Result<DenseMatrix<f64>> {
        let w3_bar = self.target_unlabelled_graph()?;
        let tot_b = vstack(&self.inputs.ub, &self.inputs.b)?;
        info!("Computing F3_bar");
        self.neighbourhood_term(&self.inputs.xub, "XuB", &tot_b, &w3_bar)
    }

    /// Assemble the joint `(d + h) × (d + h)` matrix Q.
    pub fn joint_matrix(&self) -> Result<DenseMatrix<f64>> {
        let structural = self.structural_term()?;
        let labelled = self.labelled_term()?;
        let source_unlabelled = self.source_unlabelled_term()?;
        let target_unlabelled = self.target_unlabelled_term()?;

        let _timer = StageTimer::start(self.diagnostics(), Stage::JointMatrix);
        info!("Computing Q");
        let (d, h) = (self.d, self.h);
        let n = d + h;
        let (w2, w3, lambda_2) = (self.params.w2, self.params.w3, self.params.lambda_2);

        let mut data = vec![0.0; n * n];
        for i in 0..d {
            for j in 0..d {
                data[i * n + j] =
                    w2 * labelled.get((i, j)) - w3 * source_unlabelled.get((i, j));
            }
        }
        for i in 0..h {
            for j in 0..h {
                data[(d + i) * n + d + j] = -w3 * lambda_2 * target_unlabelled.get((i, j));
            }
        }
        for i in 0..n {
            for j in 0..n {
                data[i * n + j] -= structural.get((i, j));
            }
        }
        let q = from_row_major(n, n, data)?;
        self.diagnostics.shape("Q", n, n);

        if cfg!(debug_assertions) {
            if let Err(e) = check_symmetry(&q, SYMMETRY_TOLERANCE) {
                self.diagnostics.warning(&format!("joint matrix Q: {}", e));
            }
        }
        Ok(q)
    }

    /// Top-`dims` left singular vectors of `q`, split into `Pa` and `Pb`.
    pub fn projection(&self, q: &DenseMatrix<f64>) -> Result<Projection> {
        info!("Source feature space dimensions = {}", self.d);
        info!("Target feature space dimensions = {}", self.h);
        project(q, self.d, &self.params, self.diagnostics())
    }

    /// Map source documents (`n × (M + rA)`) into the joint space.
    pub fn project_source(
        &self,
        documents: &DenseMatrix<f64>,
        projection: &Projection,
    ) -> Result<DenseMatrix<f64>> {
        project_instances(
            documents,
            &self.inputs.ua,
            &self.inputs.a,
            &projection.pa,
            self.diagnostics(),
        )
    }

    /// Map target documents (`n × (M + rB)`) into the joint space.
    pub fn project_target(
        &self,
        documents: &DenseMatrix<f64>,
        projection: &Projection,
    ) -> Result<DenseMatrix<f64>> {
        project_instances(
            documents,
            &self.inputs.ub,
            &self.inputs.b,
            &projection.pb,
            self.diagnostics(),
        )
    }

    pub fn save_embedding<P: AsRef<Path>>(&self, path: P, q: &DenseMatrix<f64>) -> Result<()> {
        save_matrix(path, q, self.diagnostics())
    }

    pub fn load_embedding<P: AsRef<Path>>(&self, path: P) -> Result<DenseMatrix<f64>> {
        load_matrix(path, self.diagnostics())
    }

    /// Explicit symmetry check of `q` (absolute tolerance).
    pub fn check_symmetry(&self, q: &DenseMatrix<f64>, tolerance: f64) -> Result<()> {
        check_symmetry(q, tolerance)
    }
}
