//! Binary classifier used to evaluate an embedding.
//!
//! Positive instances are labeled `+1`, negative instances `-1`.
//! [`LogisticClassifier`] wraps smartcore's L2-regularised logistic regression;
//! the regularisation is given as the inverse strength `C` (default `0.1`),
//! mapped to smartcore's `alpha = 1 / C`.

use log::{debug, info};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

use crate::diagnostics::{Diagnostics, Stage, StageTimer};
use crate::error::{Result, SupEmbError};
use crate::linalg::vstack;

pub const DEFAULT_REGULARISATION_C: f64 = 0.1;

pub trait BinaryClassifier {
    fn fit(&mut self, positive: &DenseMatrix<f64>, negative: &DenseMatrix<f64>) -> Result<()>;

    /// Accuracy in `[0, 1]` on the given labeled instances.
    fn score(&self, positive: &DenseMatrix<f64>, negative: &DenseMatrix<f64>) -> Result<f64>;
}

/// Stack positives over negatives with their `+1 / -1` labels.
pub fn labelled_design(
    positive: &DenseMatrix<f64>,
    negative: &DenseMatrix<f64>,
) -> Result<(DenseMatrix<f64>, Vec<i32>)> {
    let x = vstack(positive, negative)?;
    let y: Vec<i32> = std::iter::repeat(1)
        .take(positive.shape().0)
        .chain(std::iter::repeat(-1).take(negative.shape().0))
        .collect();
    Ok((x, y))
}

/// Fraction of positions where `predicted` equals `truth`.
pub fn accuracy(truth: &[i32], predicted: &[i32]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

type Model = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;

pub struct LogisticClassifier<'a> {
    c: f64,
    model: Option<Model>,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> LogisticClassifier<'a> {
    pub fn new(c: f64, diagnostics: &'a dyn Diagnostics) -> Self {
        Self { c, model: None, diagnostics }
    }

    pub fn regularisation_c(&self) -> f64 {
        self.c
    }

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<i32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| SupEmbError::Classifier("classifier used before fit".into()))?;
        model
            .predict(x)
            .map_err(|e| SupEmbError::Classifier(e.to_string()))
    }
}

impl BinaryClassifier for LogisticClassifier<'_> {
    fn fit(&mut self, positive: &DenseMatrix<f64>, negative: &DenseMatrix<f64>) -> Result<()> {
        let _timer = StageTimer::start(self.diagnostics, Stage::Classifier);
        let (x, y) = labelled_design(positive, negative)?;
        debug!("Training logistic regression on {} instances (C={})", y.len(), self.c);
        let params = LogisticRegressionParameters::default().with_alpha(1.0 / self.c);
        let model = LogisticRegression::fit(&x, &y, params)
            .map_err(|e| SupEmbError::Classifier(e.to_string()))?;
        self.model = Some(model);

        let train_accuracy = accuracy(&y, &self.predict(&x)?);
        info!("Train accuracy = {:.6}", train_accuracy);
        Ok(())
    }

    fn score(&self, positive: &DenseMatrix<f64>, negative: &DenseMatrix<f64>) -> Result<f64> {
        let (x, y) = labelled_design(positive, negative)?;
        let predicted = self.predict(&x)?;
        Ok(accuracy(&y, &predicted))
    }
}
