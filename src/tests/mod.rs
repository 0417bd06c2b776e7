mod test_graph;
mod test_io;
mod test_similarity;

use crate::builder::EmbeddingParams;

/// Neighbourhood and rank settings of the small synthetic scenario.
pub const SCENARIO_PARAMS: EmbeddingParams = EmbeddingParams {
    w1: 1.0,
    w2: 1.0,
    w3: 1.0,
    lambda_1: 1.0,
    lambda_2: 1.0,
    k2: 2,
    k3: 2,
    k3_bar: 2,
    dims: 4,
    svd_eps: f64::EPSILON,
    svd_max_iterations: 0,
};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
