//! The image-to-tensor transform shared by training and serving.
//!
//! The base transform defined here is the preprocessing contract: the
//! training data pipeline and the single-image inference path must run the
//! exact same function, because any divergence between the two degrades
//! accuracy silently instead of raising an error. Training-time
//! augmentation happens *before* this transform and only on the train path.

use ecosort_core::{Error, ImageDimensions, Result};
use image::DynamicImage;

/// Deterministic transform from a raw image to a fixed-size normalized
/// tensor: force 3-channel RGB, resize (not crop) to the target size, and
/// scale per-channel intensity from [0, 255] to [0, 1].
///
/// Output layout is HWC (row-major, interleaved channels).
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    dims: ImageDimensions,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(ImageDimensions::imagenet())
    }
}

impl ImagePreprocessor {
    pub fn new(dims: ImageDimensions) -> Self {
        Self { dims }
    }

    /// Expected output length: height * width * 3.
    pub fn tensor_len(&self) -> usize {
        self.dims.tensor_len()
    }

    pub fn dimensions(&self) -> ImageDimensions {
        self.dims
    }

    /// Applies the base transform. Alpha-channel, palette, and grayscale
    /// inputs are converted to RGB before resizing.
    pub fn preprocess(&self, image: &DynamicImage) -> Vec<f32> {
        let rgb = image.to_rgb8();
        let resized = if rgb.dimensions() == (self.dims.width, self.dims.height) {
            rgb
        } else {
            image::imageops::resize(
                &rgb,
                self.dims.width,
                self.dims.height,
                image::imageops::FilterType::Lanczos3,
            )
        };

        resized
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect()
    }

    /// Decodes raw image bytes and applies the base transform.
    pub fn preprocess_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| Error::Image(format!("Failed to decode image: {}", e)))?;
        Ok(self.preprocess(&image))
    }

    /// Loads an image from disk and applies the base transform.
    pub fn preprocess_path(&self, path: &std::path::Path) -> Result<Vec<f32>> {
        let image = image::open(path)
            .map_err(|e| Error::Image(format!("Failed to load image {}: {}", path.display(), e)))?;
        Ok(self.preprocess(&image))
    }
}
