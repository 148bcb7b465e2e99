//! The collaborator interface the lifecycle manager depends on.

use ecosort_core::{Category, EvaluationReport, Result, TrainingHistory};
use std::path::Path;

/// One preprocessed image paired with its category label.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Output of the base preprocessing transform (HWC, values in [0, 1])
    pub tensor: Vec<f32>,
    pub label: Category,
}

impl Sample {
    pub fn new(tensor: Vec<f32>, label: Category) -> Self {
        Self { tensor, label }
    }
}

/// A trainable binary waste classifier.
///
/// `predict` returns the probability of the Recyclable class; the 0.5
/// decision threshold and the Organic=0/Recyclable=1 encoding live in
/// `ecosort_core::types` and are shared with label encoding.
pub trait TrainableClassifier: Sized + Send + Sync {
    /// Trains on `train`, tracking per-epoch metrics against `val`.
    fn train(&mut self, train: &[Sample], val: &[Sample], epochs: usize)
        -> Result<TrainingHistory>;

    /// Computes loss and accuracy over a held-out test set.
    fn evaluate(&self, test: &[Sample]) -> Result<EvaluationReport>;

    /// Scores one preprocessed image tensor; the result is in [0, 1].
    fn predict(&self, tensor: &[f32]) -> Result<f32>;

    /// Serializes the full model state to `path`.
    fn save(&self, path: &Path) -> Result<()>;

    /// Deserializes a model from `path`; fails with `CorruptArtifact` when
    /// the contents are not a valid artifact for this architecture.
    fn load(path: &Path) -> Result<Self>;
}
