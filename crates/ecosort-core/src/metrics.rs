//! Training and evaluation metric records.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Per-epoch training history for one retraining run.
///
/// Persisted as JSON alongside the model artifact so the serving process
/// can report how the active model was trained.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<usize>,
    pub loss: Vec<f32>,
    pub accuracy: Vec<f32>,
    pub precision: Vec<f32>,
    pub recall: Vec<f32>,
    pub val_loss: Vec<f32>,
    pub val_accuracy: Vec<f32>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the metrics for one epoch.
    #[allow(clippy::too_many_arguments)]
    pub fn add_epoch(
        &mut self,
        epoch: usize,
        loss: f32,
        accuracy: f32,
        precision: f32,
        recall: f32,
        val_loss: f32,
        val_accuracy: f32,
    ) {
        self.epochs.push(epoch);
        self.loss.push(loss);
        self.accuracy.push(accuracy);
        self.precision.push(precision);
        self.recall.push(recall);
        self.val_loss.push(val_loss);
        self.val_accuracy.push(val_accuracy);
    }

    pub fn num_epochs(&self) -> usize {
        self.epochs.len()
    }

    /// Epoch with the best validation accuracy, if any epochs were recorded.
    pub fn best_epoch(&self) -> Option<usize> {
        self.val_accuracy
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| self.epochs[idx])
    }

    /// Saves the history as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize history: {}", e)))?;
        fs::write(path, json)?;
        info!("Training history saved to {:?}", path);
        Ok(())
    }

    /// Loads a previously persisted history.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let history = serde_json::from_str(&json)
            .map_err(|e| Error::Serialization(format!("Failed to deserialize history: {}", e)))?;
        Ok(history)
    }
}

/// Result of evaluating a model on the held-out test split.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub loss: f32,
    pub accuracy: f32,
}

/// Binary-classification counts used to derive precision and recall,
/// with Recyclable treated as the positive class.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl BinaryCounts {
    /// Records one prediction against its target.
    pub fn record(&mut self, predicted_positive: bool, actual_positive: bool) {
        match (predicted_positive, actual_positive) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positives + self.true_negatives) as f32 / total as f32
    }

    pub fn precision(&self) -> f32 {
        let denom = self.true_positives + self.false_positives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f32 / denom as f32
    }

    pub fn recall(&self) -> f32 {
        let denom = self.true_positives + self.false_negatives;
        if denom == 0 {
            return 0.0;
        }
        self.true_positives as f32 / denom as f32
    }
}
