//! Trainable classifier for the EcoSort waste classification service.
//!
//! The classifier is a pretrained-backbone-plus-trainable-head binary
//! model hidden behind the [`TrainableClassifier`] trait, so the lifecycle
//! and orchestration code never depends on the numeric internals.

pub mod artifact;
pub mod classifier;
pub mod model;

pub use artifact::ModelArtifact;
pub use classifier::{Sample, TrainableClassifier};
pub use model::{EcoSortModel, FeatureExtractor, PooledBackbone};
