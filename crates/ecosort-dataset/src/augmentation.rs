//! Training-time image augmentation.
//!
//! Augmentation is layered on top of the base preprocessing transform and
//! applied only when building training batches; the inference path never
//! sees it. Out-of-bounds samples are filled with the nearest edge pixel.

use ecosort_core::AugmentationConfig;
use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use rand::Rng;

/// Randomized augmentation pipeline: rotation, shift, shear, zoom, and
/// horizontal flip, each drawn per image from the configured ranges.
pub struct AugmentationPipeline {
    config: AugmentationConfig,
}

impl Default for AugmentationPipeline {
    fn default() -> Self {
        Self::new(AugmentationConfig::default())
    }
}

impl AugmentationPipeline {
    pub fn new(config: AugmentationConfig) -> Self {
        Self { config }
    }

    /// Applies one random augmentation draw to an image.
    pub fn augment(&self, image: &DynamicImage, rng: &mut impl Rng) -> DynamicImage {
        let mut augmented = image.to_rgb8();

        if self.config.horizontal_flip && rng.gen_bool(0.5) {
            augmented = image::imageops::flip_horizontal(&augmented);
        }

        if self.config.rotation_range > 0.0 {
            let angle =
                rng.gen_range(-self.config.rotation_range..=self.config.rotation_range);
            augmented = rotate(&augmented, angle);
        }

        if self.config.width_shift > 0.0 || self.config.height_shift > 0.0 {
            let (width, height) = augmented.dimensions();
            let dx = rng.gen_range(-self.config.width_shift..=self.config.width_shift)
                * width as f32;
            let dy = rng.gen_range(-self.config.height_shift..=self.config.height_shift)
                * height as f32;
            augmented = shift(&augmented, dx, dy);
        }

        if self.config.shear > 0.0 {
            let factor = rng.gen_range(-self.config.shear..=self.config.shear);
            augmented = shear(&augmented, factor);
        }

        if self.config.zoom > 0.0 {
            let factor = rng.gen_range(1.0 - self.config.zoom..=1.0 + self.config.zoom);
            augmented = zoom(&augmented, factor);
        }

        DynamicImage::ImageRgb8(augmented)
    }
}

/// Samples the nearest in-bounds pixel, the 'nearest' fill mode.
fn sample(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = image.dimensions();
    let xi = (x.round() as i64).clamp(0, width as i64 - 1) as u32;
    let yi = (y.round() as i64).clamp(0, height as i64 - 1) as u32;
    *image.get_pixel(xi, yi)
}

/// Rotates around the image center by `angle` degrees.
fn rotate(image: &RgbImage, angle: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let rad = angle.to_radians();
    let (sin, cos) = rad.sin_cos();

    ImageBuffer::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        // Inverse rotation maps each target pixel back onto the source.
        let src_x = cx + dx * cos + dy * sin;
        let src_y = cy - dx * sin + dy * cos;
        sample(image, src_x, src_y)
    })
}

/// Translates by (dx, dy) pixels.
fn shift(image: &RgbImage, dx: f32, dy: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        sample(image, x as f32 - dx, y as f32 - dy)
    })
}

/// Horizontal shear: each row offset proportionally to its distance from
/// the vertical center.
fn shear(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let cy = height as f32 / 2.0;
    ImageBuffer::from_fn(width, height, |x, y| {
        let offset = factor * (y as f32 - cy);
        sample(image, x as f32 - offset, y as f32)
    })
}

/// Zooms around the center by `factor` (>1 zooms in, <1 zooms out).
fn zoom(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    ImageBuffer::from_fn(width, height, |x, y| {
        let src_x = cx + (x as f32 - cx) / factor;
        let src_y = cy + (y as f32 - cy) / factor;
        sample(image, src_x, src_y)
    })
}
