//! Classifier seam for the governed inference engine.
//!
//! The engine only ever talks to the [`Classifier`] trait so the decision
//! path can be exercised with deterministic fakes. [`LinearModel`] is the
//! production implementation: it evaluates a TF-IDF + linear artifact
//! exported by the training pipeline.

pub mod linear;
pub mod risk;

use thiserror::Error;

pub use linear::LinearModel;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Model artifact not found: {path}")]
    ArtifactNotFound { path: String },

    #[error("Failed to read model artifact {path}: {message}")]
    Io { path: String, message: String },

    #[error("Model artifact is not valid JSON: {message}")]
    Malformed { message: String },

    #[error("Model artifact is inconsistent: {message}")]
    Inconsistent { message: String },

    #[error("Prediction failed: {message}")]
    Prediction { message: String },
}

pub trait Classifier {
    /// Class labels in the classifier's canonical order.
    ///
    /// `predict_proba` output is aligned with this slice, and ties are
    /// broken in its favor, so the order must be stable for a loaded model.
    fn labels(&self) -> &[String];

    /// Version tag stamped into audit records.
    fn version(&self) -> &str;

    /// Probability distribution over `labels()`, aligned by index.
    fn predict_proba(&self, text: &str) -> Result<Vec<f64>, ClassifierError>;
}
