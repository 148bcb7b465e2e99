//! Ownership of the active model instance.
//!
//! The lifecycle manager is the single writer of the active handle.
//! Inference callers borrow read access by cloning the `Arc` out from
//! under a short read lock, so a swap is a pointer replacement and
//! in-flight requests finish on whichever fully-formed model they started
//! with.

use ecosort_core::{Error, Result};
use ecosort_model::TrainableClassifier;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Serving state of the lifecycle manager.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    /// No artifact loaded; inference fails recoverably
    Unloaded,
    /// An active model is serving
    Ready,
    /// A replacement artifact is being validated; the old model keeps serving
    Swapping,
}

/// Owns the currently active classifier and mediates all access to it.
pub struct ModelLifecycle<M: TrainableClassifier> {
    active: RwLock<Option<Arc<M>>>,
    generation: AtomicU64,
    swapping: AtomicBool,
}

impl<M: TrainableClassifier> Default for ModelLifecycle<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: TrainableClassifier> ModelLifecycle<M> {
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
            generation: AtomicU64::new(0),
            swapping: AtomicBool::new(false),
        }
    }

    /// Loads the artifact at startup, if one exists.
    ///
    /// Returns `Ok(false)` when no artifact is present; the manager stays
    /// Unloaded and the serving process keeps running.
    pub async fn load_initial(&self, path: &Path) -> Result<bool> {
        if !path.exists() {
            warn!(
                "No model artifact at {:?}; serving will reject predictions until a retrain completes",
                path
            );
            return Ok(false);
        }
        let model = M::load(path)?;
        *self.active.write().await = Some(Arc::new(model));
        self.generation.store(1, Ordering::SeqCst);
        info!("Model loaded from {:?}", path);
        Ok(true)
    }

    /// Clones out the active handle, or fails fast with `ModelNotLoaded`.
    pub async fn active(&self) -> Result<Arc<M>> {
        self.active
            .read()
            .await
            .clone()
            .ok_or(Error::ModelNotLoaded)
    }

    /// Validates a freshly trained artifact and atomically replaces the
    /// active handle with it.
    ///
    /// The new artifact is loaded into a separate instance before the
    /// handle is touched; a load failure leaves the previous model serving
    /// untouched.
    pub async fn swap_from(&self, path: &Path) -> Result<u64> {
        self.swapping.store(true, Ordering::SeqCst);
        let loaded = M::load(path);
        let result = match loaded {
            Ok(model) => {
                *self.active.write().await = Some(Arc::new(model));
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                info!("Swapped in model generation {} from {:?}", generation, path);
                Ok(generation)
            }
            Err(e) => {
                warn!("Refusing swap; new artifact failed to load: {}", e);
                Err(e)
            }
        };
        self.swapping.store(false, Ordering::SeqCst);
        result
    }

    pub async fn status(&self) -> LifecycleStatus {
        let has_model = self.active.read().await.is_some();
        derive_status(self.swapping.load(Ordering::SeqCst), has_model)
    }

    /// Monotonic counter incremented on every successful swap.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Swapping only exists between two served models; with no active model
/// the manager is still Unloaded even while a first load is in progress.
fn derive_status(swapping: bool, has_model: bool) -> LifecycleStatus {
    match (swapping, has_model) {
        (true, true) => LifecycleStatus::Swapping,
        (false, true) => LifecycleStatus::Ready,
        (_, false) => LifecycleStatus::Unloaded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosort_core::{Category, TrainingParams};
    use ecosort_model::{EcoSortModel, Sample};
    use std::fs;
    use tempfile::TempDir;

    fn solid_tensor(value: f32) -> Vec<f32> {
        vec![value; 224 * 224 * 3]
    }

    fn save_trained_model(path: &Path, seed: u64) {
        let samples = vec![
            Sample::new(solid_tensor(0.9), Category::Organic),
            Sample::new(solid_tensor(0.1), Category::Recyclable),
        ];
        let mut model = EcoSortModel::new(TrainingParams {
            seed,
            ..TrainingParams::default()
        });
        model.train(&samples, &[], 2).unwrap();
        model.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_unloaded_rejects_inference() {
        let lifecycle: ModelLifecycle<EcoSortModel> = ModelLifecycle::new();
        assert_eq!(lifecycle.status().await, LifecycleStatus::Unloaded);
        assert!(matches!(
            lifecycle.active().await,
            Err(Error::ModelNotLoaded)
        ));
    }

    #[test]
    fn test_status_never_swapping_without_model() {
        assert_eq!(derive_status(true, false), LifecycleStatus::Unloaded);
        assert_eq!(derive_status(false, false), LifecycleStatus::Unloaded);
        assert_eq!(derive_status(true, true), LifecycleStatus::Swapping);
        assert_eq!(derive_status(false, true), LifecycleStatus::Ready);
    }

    #[tokio::test]
    async fn test_load_initial_missing_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let lifecycle: ModelLifecycle<EcoSortModel> = ModelLifecycle::new();

        let loaded = lifecycle
            .load_initial(&temp_dir.path().join("missing.json"))
            .await
            .unwrap();
        assert!(!loaded);
        assert_eq!(lifecycle.status().await, LifecycleStatus::Unloaded);
    }

    #[tokio::test]
    async fn test_load_initial_then_ready() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        save_trained_model(&path, 1);

        let lifecycle: ModelLifecycle<EcoSortModel> = ModelLifecycle::new();
        assert!(lifecycle.load_initial(&path).await.unwrap());
        assert_eq!(lifecycle.status().await, LifecycleStatus::Ready);
        assert_eq!(lifecycle.generation(), 1);
        assert!(lifecycle.active().await.is_ok());
    }

    #[tokio::test]
    async fn test_swap_increments_generation() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.json");
        let second = temp_dir.path().join("second.json");
        save_trained_model(&first, 1);
        save_trained_model(&second, 2);

        let lifecycle: ModelLifecycle<EcoSortModel> = ModelLifecycle::new();
        lifecycle.load_initial(&first).await.unwrap();

        let generation = lifecycle.swap_from(&second).await.unwrap();
        assert_eq!(generation, 2);
        assert_eq!(lifecycle.status().await, LifecycleStatus::Ready);
    }

    #[tokio::test]
    async fn test_failed_swap_keeps_previous_model() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.json");
        let bad = temp_dir.path().join("bad.json");
        save_trained_model(&good, 1);
        fs::write(&bad, b"definitely not an artifact").unwrap();

        let lifecycle: ModelLifecycle<EcoSortModel> = ModelLifecycle::new();
        lifecycle.load_initial(&good).await.unwrap();
        let before = lifecycle.active().await.unwrap();

        let result = lifecycle.swap_from(&bad).await;
        assert!(matches!(result, Err(Error::CorruptArtifact(_))));

        let after = lifecycle.active().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(lifecycle.generation(), 1);
        assert_eq!(lifecycle.status().await, LifecycleStatus::Ready);
    }

    #[tokio::test]
    async fn test_inflight_reader_survives_swap() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.json");
        let second = temp_dir.path().join("second.json");
        save_trained_model(&first, 1);
        save_trained_model(&second, 2);

        let lifecycle: ModelLifecycle<EcoSortModel> = ModelLifecycle::new();
        lifecycle.load_initial(&first).await.unwrap();

        // A request in flight holds its own Arc across the swap.
        let held = lifecycle.active().await.unwrap();
        lifecycle.swap_from(&second).await.unwrap();

        let tensor = solid_tensor(0.5);
        let old_score = held.predict(&tensor).unwrap();
        assert!((0.0..=1.0).contains(&old_score));

        let new_handle = lifecycle.active().await.unwrap();
        assert!(!Arc::ptr_eq(&held, &new_handle));
    }
}
