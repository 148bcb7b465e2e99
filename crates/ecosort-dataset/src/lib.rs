//! Dataset curation and preprocessing for the EcoSort waste classifier.
//!
//! This crate turns heterogeneous raw labeled image sources into the
//! canonical two-category, train/test-split directory layout, and defines
//! the deterministic image-to-tensor transform shared by the training and
//! serving paths.

pub mod augmentation;
pub mod curator;
pub mod loader;
pub mod mapper;
pub mod preprocess;

pub use augmentation::AugmentationPipeline;
pub use curator::{CurationReport, DatasetCurator};
pub use loader::{ImageLoader, RawSource};
pub use mapper::ClassMapper;
pub use preprocess::ImagePreprocessor;
