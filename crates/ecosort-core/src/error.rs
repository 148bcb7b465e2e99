//! Error types for the EcoSort waste classification service.

use thiserror::Error;

/// Main error type for EcoSort operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// A raw source label with no configured category mapping
    #[error("Unknown source label: {0}")]
    UnknownLabel(String),

    /// Curation run where zero images mapped to a category
    #[error("No valid sources: zero images mapped to a category")]
    NoValidSources,

    /// Inference requested while no model artifact is loaded
    #[error("Model not loaded; train or upload a model artifact first")]
    ModelNotLoaded,

    /// Stored artifact could not be parsed or does not match the expected architecture
    #[error("Corrupt model artifact: {0}")]
    CorruptArtifact(String),

    /// Upload with a category outside the closed two-class set
    #[error("Invalid category: {0} (expected Organic or Recyclable)")]
    InvalidCategory(String),

    /// Retraining requested while a job is already in flight
    #[error("A retraining job is already running")]
    AlreadyRunning,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Training error
    #[error("Training error: {0}")]
    Training(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid argument error
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

/// Specialized Result type for EcoSort operations.
pub type Result<T> = std::result::Result<T, Error>;
