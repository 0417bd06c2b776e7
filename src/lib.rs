//! # supemb
//!
//! Supervised cross-domain embedding for domain adaptation. Given pivot,
//! domain, labeled and unlabeled document matrices for a source and a target
//! domain, `supemb` builds three graph-Laplacian regularisers, combines them
//! into one symmetric joint matrix Q and keeps its top singular vectors as the
//! source (`Pa`) and target (`Pb`) projections. Documents of either domain are
//! then mapped into the shared space, where a classifier trained on source
//! labels is evaluated on the target domain.
//!
//! Pipeline:
//!
//! ```text
//! inputs → similarity / k-NN → W1, W2, W3, W3' → L(W), D⁻¹ → Q → SVD → Pa, Pb
//!        → projected documents → classifier
//! ```
//!
//! ```ignore
//! use std::sync::Arc;
//! use supemb::builder::SupEmbBuilder;
//! use supemb::diagnostics::RecordingDiagnostics;
//!
//! let diagnostics = Arc::new(RecordingDiagnostics::new());
//! let supemb = SupEmbBuilder::new()
//!     .with_knn(2, 2, 2)
//!     .with_dims(4)
//!     .with_diagnostics(diagnostics.clone())
//!     .build(inputs)?;
//! let q = supemb.joint_matrix()?;
//! let projection = supemb.projection(&q)?;
//! let train = supemb.project_source(&supemb.inputs().xla_pos, &projection)?;
//! ```
//!
//! Memory: the run materialises dense matrices of size `n_l²`, `n_uA²`, `n_uB²`
//! (similarities and Laplacians), `2M × (d + h)` (U1) and `(d + h)²` (Q and its
//! SVD), so peak memory grows with the square of the largest of these. W1 and
//! L(W1) stay sparse and inverse-degree matrices are kept as diagonals.

pub mod builder;
pub mod classifier;
pub mod diagnostics;
pub mod driver;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod io;
pub mod laplacian;
pub mod linalg;
pub mod projection;
pub mod similarity;

pub use builder::{EmbeddingParams, SupEmbBuilder};
pub use diagnostics::{Diagnostics, LogDiagnostics, RecordingDiagnostics};
pub use embedding::{DomainInputs, SupEmb};
pub use error::{Result, SupEmbError};
pub use projection::Projection;

#[cfg(test)]
mod tests;
