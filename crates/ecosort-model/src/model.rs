//! The concrete EcoSort classifier: frozen pooled backbone, trainable
//! logistic head.

use crate::artifact::ModelArtifact;
use crate::classifier::{Sample, TrainableClassifier};
use ecosort_core::{
    BinaryCounts, Category, Error, EvaluationReport, ImageDimensions, Result, TrainingHistory,
    TrainingParams, DECISION_THRESHOLD,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::info;

/// Clamp bound keeping the cross-entropy loss finite.
const EPS: f32 = 1e-7;

/// Fixed transform from an image tensor to a feature vector.
///
/// Stands in for the frozen pretrained backbone: the head trains against
/// its output, and the extractor itself carries no trainable state.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, tensor: &[f32]) -> Vec<f32>;
    fn dim(&self) -> usize;
}

/// Per-channel grid average pooling over the input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PooledBackbone {
    grid: usize,
    input: ImageDimensions,
}

impl PooledBackbone {
    pub const DEFAULT_GRID: usize = 8;

    pub fn new(grid: usize, input: ImageDimensions) -> Self {
        Self { grid, input }
    }

    pub fn grid(&self) -> usize {
        self.grid
    }

    pub fn input_dimensions(&self) -> ImageDimensions {
        self.input
    }
}

impl Default for PooledBackbone {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GRID, ImageDimensions::imagenet())
    }
}

impl FeatureExtractor for PooledBackbone {
    fn extract(&self, tensor: &[f32]) -> Vec<f32> {
        let width = self.input.width as usize;
        let height = self.input.height as usize;
        let channels = self.input.channels as usize;

        let mut sums = vec![0.0f32; self.dim()];
        let mut counts = vec![0u32; self.dim()];

        for y in 0..height {
            let cell_y = y * self.grid / height;
            for x in 0..width {
                let cell_x = x * self.grid / width;
                let pixel = (y * width + x) * channels;
                for c in 0..channels {
                    let feature = (cell_y * self.grid + cell_x) * channels + c;
                    sums[feature] += tensor[pixel + c];
                    counts[feature] += 1;
                }
            }
        }

        sums.iter()
            .zip(&counts)
            .map(|(&sum, &count)| if count > 0 { sum / count as f32 } else { 0.0 })
            .collect()
    }

    fn dim(&self) -> usize {
        self.grid * self.grid * self.input.channels as usize
    }
}

/// Trainable logistic head over the backbone features.
#[derive(Debug, Clone)]
pub(crate) struct LogisticHead {
    pub(crate) weights: Vec<f32>,
    pub(crate) bias: f32,
}

impl LogisticHead {
    fn init(dim: usize, rng: &mut impl Rng) -> Self {
        let scale = 1.0 / (dim as f32).sqrt();
        Self {
            weights: (0..dim).map(|_| rng.gen_range(-scale..scale)).collect(),
            bias: 0.0,
        }
    }

    fn forward(&self, features: &[f32]) -> f32 {
        let z: f32 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias;
        sigmoid(z)
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

fn bce_loss(score: f32, target: f32) -> f32 {
    let p = score.clamp(EPS, 1.0 - EPS);
    -(target * p.ln() + (1.0 - target) * (1.0 - p).ln())
}

/// Binary waste classifier: [`PooledBackbone`] features into a
/// [`LogisticHead`] trained with minibatch gradient descent on binary
/// cross-entropy.
pub struct EcoSortModel {
    backbone: PooledBackbone,
    head: LogisticHead,
    params: TrainingParams,
}

impl EcoSortModel {
    /// Builds an untrained model with seeded head initialisation.
    pub fn new(params: TrainingParams) -> Self {
        let backbone = PooledBackbone::default();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let head = LogisticHead::init(backbone.dim(), &mut rng);
        Self {
            backbone,
            head,
            params,
        }
    }

    pub(crate) fn from_parts(backbone: PooledBackbone, weights: Vec<f32>, bias: f32) -> Self {
        Self {
            backbone,
            head: LogisticHead { weights, bias },
            params: TrainingParams::default(),
        }
    }

    pub fn backbone(&self) -> &PooledBackbone {
        &self.backbone
    }

    pub(crate) fn head_weights(&self) -> (&[f32], f32) {
        (&self.head.weights, self.head.bias)
    }

    fn check_tensor(&self, tensor: &[f32]) -> Result<()> {
        let expected = self.backbone.input_dimensions().tensor_len();
        if tensor.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "Expected tensor of length {}, got {}",
                expected,
                tensor.len()
            )));
        }
        Ok(())
    }

    fn extract_set(&self, samples: &[Sample]) -> Result<Vec<(Vec<f32>, f32)>> {
        samples
            .iter()
            .map(|sample| {
                self.check_tensor(&sample.tensor)?;
                Ok((self.backbone.extract(&sample.tensor), sample.label.target()))
            })
            .collect()
    }

    /// Mean loss and prediction counts over an extracted feature set.
    fn measure(&self, set: &[(Vec<f32>, f32)]) -> (f32, BinaryCounts) {
        let mut loss_sum = 0.0;
        let mut counts = BinaryCounts::default();
        for (features, target) in set {
            let score = self.head.forward(features);
            loss_sum += bce_loss(score, *target);
            counts.record(score > DECISION_THRESHOLD, *target > 0.5);
        }
        let mean_loss = if set.is_empty() {
            0.0
        } else {
            loss_sum / set.len() as f32
        };
        (mean_loss, counts)
    }
}

impl TrainableClassifier for EcoSortModel {
    fn train(
        &mut self,
        train: &[Sample],
        val: &[Sample],
        epochs: usize,
    ) -> Result<TrainingHistory> {
        if train.is_empty() {
            return Err(Error::Training("training set is empty".to_string()));
        }

        let train_set = self.extract_set(train)?;
        let val_set = if val.is_empty() {
            // Small datasets may not yield a validation holdout; fall back
            // to measuring against the train set so the history stays
            // fully populated.
            self.extract_set(train)?
        } else {
            self.extract_set(val)?
        };

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut history = TrainingHistory::new();
        let mut order: Vec<usize> = (0..train_set.len()).collect();
        let batch_size = self.params.batch_size.max(1);
        let lr = self.params.learning_rate;

        for epoch in 0..epochs {
            // Fisher-Yates shuffle of the minibatch order.
            for i in (1..order.len()).rev() {
                let j = rng.gen_range(0..=i);
                order.swap(i, j);
            }

            for batch in order.chunks(batch_size) {
                let mut grad_w = vec![0.0f32; self.head.weights.len()];
                let mut grad_b = 0.0f32;
                for &idx in batch {
                    let (features, target) = &train_set[idx];
                    let score = self.head.forward(features);
                    let delta = score - target;
                    for (g, x) in grad_w.iter_mut().zip(features) {
                        *g += delta * x;
                    }
                    grad_b += delta;
                }
                let scale = lr / batch.len() as f32;
                for (w, g) in self.head.weights.iter_mut().zip(&grad_w) {
                    *w -= scale * g;
                }
                self.head.bias -= scale * grad_b;
            }

            let (loss, train_counts) = self.measure(&train_set);
            let (val_loss, val_counts) = self.measure(&val_set);
            history.add_epoch(
                epoch,
                loss,
                train_counts.accuracy(),
                val_counts.precision(),
                val_counts.recall(),
                val_loss,
                val_counts.accuracy(),
            );
            info!(
                "Epoch {}: loss={:.4}, acc={:.4}, val_loss={:.4}, val_acc={:.4}",
                epoch,
                loss,
                train_counts.accuracy(),
                val_loss,
                val_counts.accuracy()
            );
        }

        Ok(history)
    }

    fn evaluate(&self, test: &[Sample]) -> Result<EvaluationReport> {
        if test.is_empty() {
            return Err(Error::InvalidArgument("test set is empty".to_string()));
        }
        let test_set = self.extract_set(test)?;
        let (loss, counts) = self.measure(&test_set);
        Ok(EvaluationReport {
            loss,
            accuracy: counts.accuracy(),
        })
    }

    fn predict(&self, tensor: &[f32]) -> Result<f32> {
        self.check_tensor(tensor)?;
        let features = self.backbone.extract(tensor);
        Ok(self.head.forward(&features))
    }

    fn save(&self, path: &Path) -> Result<()> {
        ModelArtifact::from_model(self).save(path)
    }

    fn load(path: &Path) -> Result<Self> {
        ModelArtifact::load(path)?.into_model()
    }
}
