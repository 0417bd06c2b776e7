//! Entry points for one source/target pair.
//!
//! A pair `(source, target)` lives in `<work_dir>/<source>-<target>/` and
//! holds `Ua.mtx`, `Ub.mtx`, `A.mtx`, `B.mtx`, `XlA_pos.mtx`, `XlA_neg.mtx`,
//! `XuA.mtx`, `XuB.mtx` plus the target test split `XlB_pos.mtx`,
//! `XlB_neg.mtx`. The joint matrix is persisted there as `Q.mtx`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::builder::{EmbeddingParams, SupEmbBuilder};
use crate::classifier::{BinaryClassifier, LogisticClassifier, DEFAULT_REGULARISATION_C};
use crate::diagnostics::Diagnostics;
use crate::embedding::DomainInputs;
use crate::error::Result;
use crate::io::load_matrix;

pub const EMBEDDING_FILE: &str = "Q.mtx";

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Directory containing one `<source>-<target>` folder per pair.
    pub work_dir: PathBuf,
    pub params: EmbeddingParams,
    /// Inverse L2 regularisation strength of the classifier.
    pub regularisation_c: f64,
    /// Load an existing `Q.mtx` instead of recomputing it.
    pub reuse_embedding: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("../work"),
            params: EmbeddingParams::default(),
            regularisation_c: DEFAULT_REGULARISATION_C,
            reuse_embedding: false,
        }
    }
}

impl DriverConfig {
    pub fn pair_dir(&self, source: &str, target: &str) -> PathBuf {
        self.work_dir.join(format!("{}-{}", source, target))
    }
}

/// Outcome of [`process`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationReport {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    /// Order of Q, `d + h`.
    pub joint_dim: usize,
    pub dims: usize,
}

/// Outcome of [`no_adapt_baseline`].
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineReport {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
}

fn load(dir: &Path, name: &str, diagnostics: &dyn Diagnostics) -> Result<DenseMatrix<f64>> {
    load_matrix(dir.join(format!("{}.mtx", name)), diagnostics)
}

/// Read the eight input matrices of a pair directory.
pub fn load_inputs(dir: &Path, diagnostics: &dyn Diagnostics) -> Result<DomainInputs> {
    Ok(DomainInputs {
        ua: load(dir, "Ua", diagnostics)?,
        ub: load(dir, "Ub", diagnostics)?,
        a: load(dir, "A", diagnostics)?,
        b: load(dir, "B", diagnostics)?,
        xla_pos: load(dir, "XlA_pos", diagnostics)?,
        xla_neg: load(dir, "XlA_neg", diagnostics)?,
        xua: load(dir, "XuA", diagnostics)?,
        xub: load(dir, "XuB", diagnostics)?,
    })
}

/// End-to-end run: embed, persist Q, project, train on source, test on target.
pub fn process(
    source: &str,
    target: &str,
    config: &DriverConfig,
    diagnostics: Arc<dyn Diagnostics>,
) -> Result<AdaptationReport> {
    let dir = config.pair_dir(source, target);
    info!("Processing {} -> {} in {}", source, target, dir.display());

    let inputs = load_inputs(&dir, diagnostics.as_ref())?;
    let supemb = SupEmbBuilder::new()
        .with_params(config.params.clone())
        .with_diagnostics(diagnostics.clone())
        .build(inputs)?;

    let q_path = dir.join(EMBEDDING_FILE);
    if config.reuse_embedding && q_path.exists() {
        info!("Reusing embedding {}", q_path.display());
    } else {
        let q = supemb.joint_matrix()?;
        supemb.save_embedding(&q_path, &q)?;
    }
    let q = supemb.load_embedding(&q_path)?;
    let projection = supemb.projection(&q)?;

    let pos_train = supemb.project_source(&supemb.inputs().xla_pos, &projection)?;
    let neg_train = supemb.project_source(&supemb.inputs().xla_neg, &projection)?;
    let mut model = LogisticClassifier::new(config.regularisation_c, diagnostics.as_ref());
    model.fit(&pos_train, &neg_train)?;
    let train_accuracy = model.score(&pos_train, &neg_train)?;

    let xlb_pos = load(&dir, "XlB_pos", diagnostics.as_ref())?;
    let xlb_neg = load(&dir, "XlB_neg", diagnostics.as_ref())?;
    let pos_test = supemb.project_target(&xlb_pos, &projection)?;
    let neg_test = supemb.project_target(&xlb_neg, &projection)?;
    let test_accuracy = model.score(&pos_test, &neg_test)?;
    info!("Test accuracy = {:.6}", test_accuracy);

    Ok(AdaptationReport {
        train_accuracy,
        test_accuracy,
        joint_dim: q.shape().0,
        dims: projection.dims(),
    })
}

/// Train on raw source labeled documents and test on raw target labeled
/// documents, without any adaptation.
pub fn no_adapt_baseline(
    source: &str,
    target: &str,
    config: &DriverConfig,
    diagnostics: &dyn Diagnostics,
) -> Result<BaselineReport> {
    let dir = config.pair_dir(source, target);
    info!("No-adapt baseline {} -> {} in {}", source, target, dir.display());

    let xla_pos = load(&dir, "XlA_pos", diagnostics)?;
    let xla_neg = load(&dir, "XlA_neg", diagnostics)?;
    let xlb_pos = load(&dir, "XlB_pos", diagnostics)?;
    let xlb_neg = load(&dir, "XlB_neg", diagnostics)?;

    let mut model = LogisticClassifier::new(config.regularisation_c, diagnostics);
    model.fit(&xla_pos, &xla_neg)?;
    let train_accuracy = model.score(&xla_pos, &xla_neg)?;
    let test_accuracy = model.score(&xlb_pos, &xlb_neg)?;
    info!("Test accuracy = {:.6}", test_accuracy);

    Ok(BaselineReport { train_accuracy, test_accuracy })
}
