use std::sync::Arc;

use crate::diagnostics::{Diagnostics, LogDiagnostics};
use crate::embedding::{DomainInputs, SupEmb};
use crate::error::Result;

// Add logging
use log::{debug, info};

/// Model parameters of one embedding run.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingParams {
    /// Weight of Rule 1. Carried for configuration parity; the structural
    /// term enters Q unscaled.
    pub w1: f64,
    /// Weight of Rule 2 (labeled neighbourhood).
    pub w2: f64,
    /// Weight of Rule 3 (unlabeled neighbourhoods).
    pub w3: f64,
    /// Carried for configuration parity; not used by the assembly.
    pub lambda_1: f64,
    /// Same-label weight in W2 and target-domain weight of Rule 3.
    pub lambda_2: f64,
    /// k for the labeled source graph (W2).
    pub k2: usize,
    /// k for the unlabeled source graph (W3).
    pub k3: usize,
    /// k for the unlabeled target graph (W3').
    pub k3_bar: usize,
    /// Number of latent dimensions retained by the SVD.
    pub dims: usize,
    /// SVD convergence threshold.
    pub svd_eps: f64,
    /// SVD iteration cap, 0 means iterate until convergence.
    pub svd_max_iterations: usize,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self {
            w1: 1.0,
            w2: 1.0,
            w3: 1.0,
            lambda_1: 1.0,
            lambda_2: 1.0,
            k2: 5,
            k3: 5,
            k3_bar: 5,
            dims: 500,
            svd_eps: f64::EPSILON,
            svd_max_iterations: 0,
        }
    }
}

pub struct SupEmbBuilder {
    params: EmbeddingParams,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Default for SupEmbBuilder {
    fn default() -> Self {
        debug!("Creating SupEmbBuilder with default parameters");
        Self {
            params: EmbeddingParams::default(),
            diagnostics: Arc::new(LogDiagnostics),
        }
    }
}

impl SupEmbBuilder {
    pub fn new() -> Self {
        info!("Initializing new SupEmbBuilder");
        Self::default()
    }

    /// Start from a full parameter set.
    pub fn with_params(mut self, params: EmbeddingParams) -> Self {
        info!("Using parameters: {:?}", params);
        self.params = params;
        self
    }

    // -------------------- Rule weights --------------------

    pub fn with_rule_weights(mut self, w1: f64, w2: f64, w3: f64) -> Self {
        info!("Configuring rule weights: w1={}, w2={}, w3={}", w1, w2, w3);
        self.params.w1 = w1;
        self.params.w2 = w2;
        self.params.w3 = w3;
        self
    }

    pub fn with_lambdas(mut self, lambda_1: f64, lambda_2: f64) -> Self {
        info!("Configuring lambdas: lambda_1={}, lambda_2={}", lambda_1, lambda_2);
        self.params.lambda_1 = lambda_1;
        self.params.lambda_2 = lambda_2;
        self
    }

    // -------------------- Neighbourhoods --------------------

    /// k for W2, W3 and W3'.
    pub fn with_knn(mut self, k2: usize, k3: usize, k3_bar: usize) -> Self {
        info!("Configuring k-NN sizes: k2={}, k3={}, k3_bar={}", k2, k3, k3_bar);
        self.params.k2 = k2;
        self.params.k3 = k3;
        self.params.k3_bar = k3_bar;
        self
    }

    // -------------------- Solver --------------------

    pub fn with_dims(mut self, dims: usize) -> Self {
        info!("Setting latent dimensions: {}", dims);
        self.params.dims = dims;
        self
    }

    pub fn with_solver(mut self, eps: f64, max_iterations: usize) -> Self {
        info!("Configuring SVD solver: eps={:e}, max_iterations={}", eps, max_iterations);
        self.params.svd_eps = eps;
        self.params.svd_max_iterations = max_iterations;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn params(&self) -> &EmbeddingParams {
        &self.params
    }

    /// Validate the inputs and produce a ready-to-run [`SupEmb`].
    pub fn build(self, inputs: DomainInputs) -> Result<SupEmb> {
        debug!("Build configuration: {:?}", self.params);
        SupEmb::new(inputs, self.params, self.diagnostics)
    }
}
