//! Shared server state and configuration.

use crate::lifecycle::ModelLifecycle;
use crate::orchestrator::{PipelineConfig, RetrainOrchestrator};
use ecosort_core::{
    AugmentationConfig, CuratorConfig, DataPaths, Prediction, Result, TrainingParams,
};
use ecosort_dataset::ImagePreprocessor;
use ecosort_model::{EcoSortModel, TrainableClassifier};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Runtime configuration assembled from CLI flags and environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub paths: DataPaths,
    pub training: TrainingParams,
    pub curator: CuratorConfig,
    pub augmentation: AugmentationConfig,
    /// Bulk raw source directories curated alongside the upload store
    pub source_dirs: Vec<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            paths: DataPaths::default(),
            training: TrainingParams::default(),
            curator: CuratorConfig::default(),
            augmentation: AugmentationConfig::default(),
            source_dirs: Vec::new(),
        }
    }
}

/// State shared by all request handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub lifecycle: Arc<ModelLifecycle<EcoSortModel>>,
    pub orchestrator: RetrainOrchestrator,
    pub preprocessor: ImagePreprocessor,
    pub started_at: Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            lifecycle: Arc::new(ModelLifecycle::new()),
            orchestrator: RetrainOrchestrator::new(),
            preprocessor: ImagePreprocessor::default(),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Captures everything the retraining pipeline needs at trigger time.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            paths: self.config.paths.clone(),
            training: self.config.training.clone(),
            curator: self.config.curator.clone(),
            augmentation: self.config.augmentation.clone(),
            source_dirs: self.config.source_dirs.clone(),
        }
    }

    /// Runs one image through the serving path: decode, shared base
    /// transform, active model, thresholded decision.
    pub async fn classify(&self, bytes: &[u8]) -> Result<Prediction> {
        let tensor = self.preprocessor.preprocess_bytes(bytes)?;
        let model = self.lifecycle.active().await?;
        let score = model.predict(&tensor)?;
        Ok(Prediction::from_score(score))
    }
}
