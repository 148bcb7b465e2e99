//! Enumeration and loading of raw labeled image sources.

use ecosort_core::{Error, ImageRecord, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

/// A raw labeled image collection: one source label per image.
///
/// Sources are cheap enumerations of paths; image bytes are only read when
/// a record is materialised or preprocessed.
#[derive(Debug, Clone)]
pub struct RawSource {
    /// Human-readable source name, used in logs and reports
    pub name: String,
    pub records: Vec<ImageRecord>,
}

impl RawSource {
    pub fn new(name: impl Into<String>, records: Vec<ImageRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Enumerates a directory whose immediate subdirectories are source
    /// labels (the trashnet-style layout, also used by the upload store).
    pub fn from_directory(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            return Err(Error::NotFound(format!(
                "Source directory not found: {}",
                dir.display()
            )));
        }
        if !dir.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "Path is not a directory: {}",
                dir.display()
            )));
        }

        let mut records = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let label_dir = entry.path();
            if !label_dir.is_dir() {
                continue;
            }
            let label = match label_dir.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            for image_path in scan_images(&label_dir)? {
                records.push(ImageRecord::new(image_path, label.clone()));
            }
        }

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("source")
            .to_string();
        Ok(Self::new(name, records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Scans a single directory (non-recursively) for image files.
pub fn scan_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if IMAGE_EXTENSIONS.contains(&ext_lower.as_str()) {
                images.push(path);
            }
        }
    }
    images.sort();
    Ok(images)
}

/// Image loading rooted at a base directory.
pub struct ImageLoader {
    root_dir: PathBuf,
}

impl ImageLoader {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Loads an image, resolving relative paths against the root.
    pub fn load_image(&self, path: &Path) -> Result<DynamicImage> {
        let full_path = self.full_path(path);
        if !full_path.exists() {
            return Err(Error::NotFound(format!(
                "Image file not found: {}",
                full_path.display()
            )));
        }
        image::open(&full_path).map_err(|e| {
            Error::Image(format!(
                "Failed to load image {}: {}",
                full_path.display(),
                e
            ))
        })
    }

    pub fn full_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::fs;
    use tempfile::TempDir;

    fn create_test_image(path: &Path) {
        let img = ImageBuffer::from_fn(10, 10, |_, _| Rgb([255u8, 0u8, 0u8]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_scan_images_filters_extensions() {
        let temp_dir = TempDir::new().unwrap();
        create_test_image(&temp_dir.path().join("a.jpg"));
        create_test_image(&temp_dir.path().join("b.png"));
        fs::write(temp_dir.path().join("notes.txt"), "text").unwrap();

        let images = scan_images(temp_dir.path()).unwrap();
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn test_source_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        let plastic = temp_dir.path().join("plastic");
        let compost = temp_dir.path().join("compost");
        fs::create_dir_all(&plastic).unwrap();
        fs::create_dir_all(&compost).unwrap();
        create_test_image(&plastic.join("bottle.jpg"));
        create_test_image(&plastic.join("bag.jpg"));
        create_test_image(&compost.join("peel.jpg"));

        let source = RawSource::from_directory(temp_dir.path()).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(
            source
                .records
                .iter()
                .filter(|r| r.source_label == "plastic")
                .count(),
            2
        );
    }

    #[test]
    fn test_source_from_missing_directory() {
        let result = RawSource::from_directory(Path::new("/nonexistent/source"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_loader_full_path() {
        let loader = ImageLoader::new("/data");
        assert_eq!(
            loader.full_path(Path::new("images/x.jpg")),
            PathBuf::from("/data/images/x.jpg")
        );
        assert_eq!(
            loader.full_path(Path::new("/abs/x.jpg")),
            PathBuf::from("/abs/x.jpg")
        );
    }

    #[test]
    fn test_load_image_not_found() {
        let loader = ImageLoader::new("/tmp");
        let result = loader.load_image(Path::new("nonexistent.jpg"));
        assert!(result.is_err());
    }
}
