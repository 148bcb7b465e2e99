//! Domain types for the EcoSort waste classification service.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Probability threshold above which a raw score is read as Recyclable.
///
/// Shared between training label encoding and inference decoding; changing
/// one side without the other silently inverts predictions.
pub const DECISION_THRESHOLD: f32 = 0.5;

/// One of the two top-level waste classes.
///
/// The class-index ordering (Organic = 0, Recyclable = 1) follows the
/// alphabetical ordering of the category directories and is load-bearing
/// for label encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Organic,
    Recyclable,
}

impl Category {
    /// All categories, in class-index order.
    pub const ALL: [Category; 2] = [Category::Organic, Category::Recyclable];

    /// Class index used for label encoding.
    pub fn index(self) -> usize {
        match self {
            Category::Organic => 0,
            Category::Recyclable => 1,
        }
    }

    /// Encodes the category as a binary training target.
    pub fn target(self) -> f32 {
        self.index() as f32
    }

    /// Applies the decision rule to a raw sigmoid score in [0, 1].
    pub fn from_score(score: f32) -> Self {
        if score > DECISION_THRESHOLD {
            Category::Recyclable
        } else {
            Category::Organic
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Organic => write!(f, "Organic"),
            Category::Recyclable => write!(f, "Recyclable"),
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "organic" => Ok(Category::Organic),
            "recyclable" => Ok(Category::Recyclable),
            _ => Err(Error::InvalidCategory(s.to_string())),
        }
    }
}

/// Train or Test partition of the curated dataset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Test];
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// A raw image plus its source label, prior to materialisation.
///
/// Created when a source is enumerated and dropped once the image is copied
/// into its canonical cell; there is no long-lived in-memory image cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Path to the image file in the raw source
    pub path: PathBuf,
    /// Fine-grained label from the raw dataset (e.g. "plastic", "compost")
    pub source_label: String,
}

impl ImageRecord {
    pub fn new(path: PathBuf, source_label: impl Into<String>) -> Self {
        Self {
            path,
            source_label: source_label.into(),
        }
    }
}

/// Classification result returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted category
    pub label: Category,
    /// max(score, 1 - score), always in [0.5, 1.0]
    pub confidence: f32,
    /// Raw sigmoid score, the probability of the Recyclable class
    pub raw_score: f32,
}

impl Prediction {
    /// Builds a prediction from a raw Recyclable-probability score.
    pub fn from_score(score: f32) -> Self {
        Self {
            label: Category::from_score(score),
            confidence: score.max(1.0 - score),
            raw_score: score,
        }
    }
}

/// Image dimensions expected by the model input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Standard ImageNet input dimensions (224x224x3).
    pub fn imagenet() -> Self {
        Self::new(224, 224, 3)
    }

    /// Total number of scalar values in one image tensor.
    pub fn tensor_len(&self) -> usize {
        (self.width * self.height * self.channels) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_index_ordering() {
        // Alphabetical: Organic before Recyclable
        assert_eq!(Category::Organic.index(), 0);
        assert_eq!(Category::Recyclable.index(), 1);
        assert_eq!(Category::ALL[0], Category::Organic);
    }

    #[test]
    fn test_category_from_score() {
        assert_eq!(Category::from_score(0.2), Category::Organic);
        assert_eq!(Category::from_score(0.5), Category::Organic);
        assert_eq!(Category::from_score(0.51), Category::Recyclable);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Organic".parse::<Category>().unwrap(), Category::Organic);
        assert_eq!(
            "recyclable".parse::<Category>().unwrap(),
            Category::Recyclable
        );
        assert!(matches!(
            "glass".parse::<Category>(),
            Err(Error::InvalidCategory(_))
        ));
    }

    #[test]
    fn test_split_display() {
        assert_eq!(Split::Train.to_string(), "train");
        assert_eq!(Split::Test.to_string(), "test");
    }

    #[test]
    fn test_prediction_from_score() {
        let low = Prediction::from_score(0.1);
        assert_eq!(low.label, Category::Organic);
        assert!((low.confidence - 0.9).abs() < 1e-6);
        assert_eq!(low.raw_score, 0.1);

        let high = Prediction::from_score(0.8);
        assert_eq!(high.label, Category::Recyclable);
        assert!((high.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_prediction_confidence_bounds() {
        for score in [0.0f32, 0.25, 0.5, 0.75, 1.0] {
            let pred = Prediction::from_score(score);
            assert!(pred.confidence >= 0.5 && pred.confidence <= 1.0);
        }
    }

    #[test]
    fn test_image_dimensions() {
        let dims = ImageDimensions::imagenet();
        assert_eq!(dims.width, 224);
        assert_eq!(dims.height, 224);
        assert_eq!(dims.channels, 3);
        assert_eq!(dims.tensor_len(), 224 * 224 * 3);
    }
}
