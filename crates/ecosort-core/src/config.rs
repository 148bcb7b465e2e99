//! Configuration structures for the EcoSort service.

use crate::error::{Error, Result};
use crate::types::ImageDimensions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// On-disk layout of the service: raw uploads, curated dataset cells, and
/// the active model artifact with its metrics record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory
    pub data_dir: PathBuf,
    /// Raw uploaded images, one subdirectory per category label
    pub uploads_dir: PathBuf,
    /// Curated training split (Category subdirectories)
    pub train_dir: PathBuf,
    /// Curated test split (Category subdirectories)
    pub test_dir: PathBuf,
    /// Single active model artifact
    pub model_path: PathBuf,
    /// Per-run training metrics record, persisted alongside the artifact
    pub metrics_path: PathBuf,
}

impl DataPaths {
    /// Derives the standard layout from a data root and a models directory.
    pub fn new(data_dir: impl Into<PathBuf>, models_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let models_dir = models_dir.into();
        Self {
            uploads_dir: data_dir.join("uploads"),
            train_dir: data_dir.join("train"),
            test_dir: data_dir.join("test"),
            model_path: models_dir.join("ecosort_model.json"),
            metrics_path: models_dir.join("training_metrics.json"),
            data_dir,
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::new("data", "models")
    }
}

/// Training hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingParams {
    /// Number of training epochs
    pub epochs: usize,
    /// Batch size
    pub batch_size: usize,
    /// Learning rate for the trainable head
    pub learning_rate: f32,
    /// Fraction of the train split held out for validation
    pub validation_split: f32,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 0.01,
            validation_split: 0.2,
            seed: 42,
        }
    }
}

/// Curation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorConfig {
    /// Fraction of each category assigned to the train split
    pub train_ratio: f32,
    /// Seed for the per-category shuffle
    pub seed: u64,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            seed: 42,
        }
    }
}

impl CuratorConfig {
    /// Validates that the train ratio leaves both splits non-degenerate.
    pub fn validate(&self) -> Result<()> {
        if self.train_ratio <= 0.0 || self.train_ratio >= 1.0 {
            return Err(Error::InvalidArgument(format!(
                "train_ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        Ok(())
    }
}

/// Training-time augmentation parameters.
///
/// Augmentation is an additive stage layered before the base preprocessing
/// transform and is never applied on the inference path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Random rotation range in degrees
    pub rotation_range: f32,
    /// Horizontal shift as a fraction of width
    pub width_shift: f32,
    /// Vertical shift as a fraction of height
    pub height_shift: f32,
    /// Shear intensity as a fraction of width per row
    pub shear: f32,
    /// Zoom range around 1.0 (e.g. 0.2 means [0.8, 1.2])
    pub zoom: f32,
    /// Whether to randomly flip horizontally
    pub horizontal_flip: bool,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            rotation_range: 20.0,
            width_shift: 0.2,
            height_shift: 0.2,
            shear: 0.2,
            zoom: 0.2,
            horizontal_flip: true,
        }
    }
}

impl AugmentationConfig {
    /// Identity configuration: no augmentation applied.
    pub fn none() -> Self {
        Self {
            rotation_range: 0.0,
            width_shift: 0.0,
            height_shift: 0.0,
            shear: 0.0,
            zoom: 0.0,
            horizontal_flip: false,
        }
    }
}

/// Model input configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInputConfig {
    /// Expected input dimensions
    pub dimensions: ImageDimensions,
}

impl Default for ModelInputConfig {
    fn default() -> Self {
        Self {
            dimensions: ImageDimensions::imagenet(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_layout() {
        let paths = DataPaths::new("/srv/ecosort/data", "/srv/ecosort/models");
        assert_eq!(paths.uploads_dir, PathBuf::from("/srv/ecosort/data/uploads"));
        assert_eq!(paths.train_dir, PathBuf::from("/srv/ecosort/data/train"));
        assert_eq!(paths.test_dir, PathBuf::from("/srv/ecosort/data/test"));
        assert_eq!(
            paths.model_path,
            PathBuf::from("/srv/ecosort/models/ecosort_model.json")
        );
    }

    #[test]
    fn test_default_training_params() {
        let params = TrainingParams::default();
        assert_eq!(params.epochs, 10);
        assert_eq!(params.batch_size, 32);
        assert_eq!(params.seed, 42);
    }

    #[test]
    fn test_curator_config_validation() {
        assert!(CuratorConfig::default().validate().is_ok());

        let zero = CuratorConfig {
            train_ratio: 0.0,
            seed: 0,
        };
        assert!(zero.validate().is_err());

        let all = CuratorConfig {
            train_ratio: 1.0,
            seed: 0,
        };
        assert!(all.validate().is_err());
    }

    #[test]
    fn test_augmentation_none_is_identity() {
        let config = AugmentationConfig::none();
        assert_eq!(config.rotation_range, 0.0);
        assert_eq!(config.zoom, 0.0);
        assert!(!config.horizontal_flip);
    }
}
