//! Persisted model artifact format.

use crate::model::{EcoSortModel, FeatureExtractor, PooledBackbone};
use chrono::{DateTime, Utc};
use ecosort_core::{Error, ImageDimensions, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

const FORMAT_VERSION: u32 = 1;

/// Serialized classifier state: backbone configuration plus head weights.
///
/// The artifact is opaque to callers; its creation timestamp doubles as an
/// implicit version for the serving side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub input: ImageDimensions,
    pub backbone_grid: usize,
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl ModelArtifact {
    pub fn from_model(model: &EcoSortModel) -> Self {
        let backbone = model.backbone();
        let (weights, bias) = model.head_weights();
        Self {
            format_version: FORMAT_VERSION,
            created_at: Utc::now(),
            input: backbone.input_dimensions(),
            backbone_grid: backbone.grid(),
            weights: weights.to_vec(),
            bias,
        }
    }

    /// Reconstructs a ready-to-predict model, validating that the stored
    /// state matches the expected architecture.
    pub fn into_model(self) -> Result<EcoSortModel> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::CorruptArtifact(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        let backbone = PooledBackbone::new(self.backbone_grid, self.input);
        if self.weights.len() != backbone.dim() {
            return Err(Error::CorruptArtifact(format!(
                "weight count {} does not match backbone dimension {}",
                self.weights.len(),
                backbone.dim()
            )));
        }
        Ok(EcoSortModel::from_parts(backbone, self.weights, self.bias))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize artifact: {}", e)))?;
        fs::write(path, json)?;
        info!("Model artifact saved to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "Model artifact not found: {}",
                path.display()
            )));
        }
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| Error::CorruptArtifact(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Sample, TrainableClassifier};
    use ecosort_core::{Category, TrainingParams};
    use tempfile::TempDir;

    fn solid_tensor(value: f32) -> Vec<f32> {
        vec![value; 224 * 224 * 3]
    }

    fn trained_model() -> EcoSortModel {
        let samples = vec![
            Sample::new(solid_tensor(0.9), Category::Organic),
            Sample::new(solid_tensor(0.1), Category::Recyclable),
        ];
        let mut model = EcoSortModel::new(TrainingParams::default());
        model.train(&samples, &[], 3).unwrap();
        model
    }

    #[test]
    fn test_save_load_roundtrip_predicts_identically() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");

        let model = trained_model();
        let tensor = solid_tensor(0.42);
        let before = model.predict(&tensor).unwrap();

        model.save(&path).unwrap();
        let restored = EcoSortModel::load(&path).unwrap();
        let after = restored.predict(&tensor).unwrap();

        assert!((before - after).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let result = EcoSortModel::load(&temp_dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_load_corrupt_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(&path, b"{ not valid json").unwrap();

        let result = EcoSortModel::load(&path);
        assert!(matches!(result, Err(Error::CorruptArtifact(_))));
    }

    #[test]
    fn test_load_dimension_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");

        let mut artifact = ModelArtifact::from_model(&trained_model());
        artifact.weights.truncate(10);
        artifact.save(&path).unwrap();

        let result = EcoSortModel::load(&path);
        assert!(matches!(result, Err(Error::CorruptArtifact(_))));
    }

    #[test]
    fn test_load_unsupported_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");

        let mut artifact = ModelArtifact::from_model(&trained_model());
        artifact.format_version = 99;
        artifact.save(&path).unwrap();

        let result = EcoSortModel::load(&path);
        assert!(matches!(result, Err(Error::CorruptArtifact(_))));
    }
}
