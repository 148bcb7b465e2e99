//! Dataset curation: raw labeled sources into the canonical layout.

use crate::mapper::ClassMapper;
use ecosort_core::{Category, CuratorConfig, Error, ImageRecord, Result, Split};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::loader::RawSource;

/// Outcome of one curation run.
#[derive(Debug, Clone, Default)]
pub struct CurationReport {
    /// Images materialised per (category, split) cell
    pub cell_counts: HashMap<(Category, Split), usize>,
    /// Images skipped per source label (unmapped labels, copy failures)
    pub skipped: HashMap<String, usize>,
}

impl CurationReport {
    pub fn count(&self, category: Category, split: Split) -> usize {
        self.cell_counts
            .get(&(category, split))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.cell_counts.values().sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Materialises raw sources into the Category x Split directory layout.
///
/// Curation is destructive-then-rebuild: any previous dataset is removed
/// before the new one is built, so a taxonomy change can never leave stale
/// images from an older mapping behind.
pub struct DatasetCurator {
    mapper: ClassMapper,
    config: CuratorConfig,
    train_dir: PathBuf,
    test_dir: PathBuf,
}

impl DatasetCurator {
    pub fn new(
        config: CuratorConfig,
        train_dir: impl Into<PathBuf>,
        test_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mapper: ClassMapper::new(),
            config,
            train_dir: train_dir.into(),
            test_dir: test_dir.into(),
        })
    }

    /// Runs a full curation over the given sources.
    ///
    /// Images whose labels have no mapping are skipped and counted, never
    /// fatal; the run only fails with `NoValidSources` when zero images
    /// resolve to a category.
    pub fn curate(&self, sources: &[RawSource]) -> Result<CurationReport> {
        let mut report = CurationReport::default();
        let mut by_category: HashMap<Category, Vec<&ImageRecord>> = HashMap::new();

        for source in sources {
            info!("Curating source '{}' ({} images)", source.name, source.len());
            for record in &source.records {
                match self.mapper.map(&record.source_label) {
                    Ok(category) => by_category.entry(category).or_default().push(record),
                    Err(Error::UnknownLabel(label)) => {
                        *report.skipped.entry(label).or_insert(0) += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if by_category.values().map(|v| v.len()).sum::<usize>() == 0 {
            return Err(Error::NoValidSources);
        }

        self.reset_layout()?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        for category in Category::ALL {
            let mut records = by_category.remove(&category).unwrap_or_default();
            shuffle(&mut records, &mut rng);

            // Split at the train-ratio index, independently per category so
            // both categories are represented proportionally in each split.
            let split_idx = (records.len() as f32 * self.config.train_ratio) as usize;
            for (i, record) in records.iter().enumerate() {
                let split = if i < split_idx {
                    Split::Train
                } else {
                    Split::Test
                };
                match self.materialise(record, category, split, &mut rng) {
                    Ok(()) => {
                        *report.cell_counts.entry((category, split)).or_insert(0) += 1;
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", record.path.display(), e);
                        *report.skipped.entry(record.source_label.clone()).or_insert(0) += 1;
                    }
                }
            }
        }

        info!(
            "Curation complete: {} images materialised, {} skipped",
            report.total(),
            report.total_skipped()
        );
        Ok(report)
    }

    /// Removes any previous dataset and recreates the empty cell layout.
    fn reset_layout(&self) -> Result<()> {
        for dir in [&self.train_dir, &self.test_dir] {
            if dir.exists() {
                fs::remove_dir_all(dir)?;
            }
        }
        for category in Category::ALL {
            fs::create_dir_all(self.cell_dir(category, Split::Train))?;
            fs::create_dir_all(self.cell_dir(category, Split::Test))?;
        }
        Ok(())
    }

    fn cell_dir(&self, category: Category, split: Split) -> PathBuf {
        let base = match split {
            Split::Train => &self.train_dir,
            Split::Test => &self.test_dir,
        };
        base.join(category.to_string())
    }

    /// Copies one record into its cell under a collision-free filename.
    fn materialise(
        &self,
        record: &ImageRecord,
        category: Category,
        split: Split,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        let target = self
            .cell_dir(category, split)
            .join(unique_filename(&record.path, &record.source_label, rng));
        fs::copy(&record.path, &target)?;
        Ok(())
    }
}

/// Builds a collision-free filename from the source label, the original
/// stem, and a random suffix, so multiple sources can contribute images
/// with identical original names.
fn unique_filename(original: &Path, label: &str, rng: &mut impl Rng) -> String {
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("img");
    let ext = original
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg");
    let suffix: u32 = rng.gen();
    format!("{}_{}_{:08x}.{}", label.to_lowercase(), stem, suffix, ext)
}

/// Fisher-Yates shuffle driven by the curator's seeded RNG.
fn shuffle<T>(items: &mut [T], rng: &mut impl Rng) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write_images(dir: &Path, label: &str, count: usize) {
        let label_dir = dir.join(label);
        fs::create_dir_all(&label_dir).unwrap();
        for i in 0..count {
            let img = ImageBuffer::from_fn(8, 8, |_, _| Rgb([0u8, 128u8, 255u8]));
            img.save(label_dir.join(format!("img{}.png", i))).unwrap();
        }
    }

    fn curator_in(temp_dir: &TempDir) -> DatasetCurator {
        DatasetCurator::new(
            CuratorConfig::default(),
            temp_dir.path().join("train"),
            temp_dir.path().join("test"),
        )
        .unwrap()
    }

    #[test]
    fn test_split_counts_per_category() {
        let temp_dir = TempDir::new().unwrap();
        let raw = temp_dir.path().join("raw");
        write_images(&raw, "compost", 10);
        write_images(&raw, "plastic", 10);

        let source = RawSource::from_directory(&raw).unwrap();
        let report = curator_in(&temp_dir).curate(&[source]).unwrap();

        for category in Category::ALL {
            let train = report.count(category, Split::Train);
            let test = report.count(category, Split::Test);
            let total = train + test;
            assert_eq!(total, 10);
            assert!((train as f32 - 0.8 * total as f32).abs() <= 1.0);
            assert_eq!(test, total - train);
        }
        assert_eq!(report.total(), 20);
    }

    #[test]
    fn test_unmapped_labels_skipped_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let raw = temp_dir.path().join("raw");
        write_images(&raw, "plastic", 4);
        write_images(&raw, "styrofoam", 3);

        let source = RawSource::from_directory(&raw).unwrap();
        let report = curator_in(&temp_dir).curate(&[source]).unwrap();

        assert_eq!(report.total(), 4);
        assert_eq!(report.skipped.get("styrofoam"), Some(&3));
    }

    #[test]
    fn test_no_valid_sources() {
        let temp_dir = TempDir::new().unwrap();
        let raw = temp_dir.path().join("raw");
        write_images(&raw, "styrofoam", 3);

        let source = RawSource::from_directory(&raw).unwrap();
        let result = curator_in(&temp_dir).curate(&[source]);
        assert!(matches!(result, Err(Error::NoValidSources)));
    }

    #[test]
    fn test_destructive_rebuild_removes_stale_images() {
        let temp_dir = TempDir::new().unwrap();
        let raw = temp_dir.path().join("raw");
        write_images(&raw, "plastic", 5);

        let curator = curator_in(&temp_dir);
        let source = RawSource::from_directory(&raw).unwrap();
        curator.curate(&[source.clone()]).unwrap();

        // Plant a stale file where a previous taxonomy might have left one.
        let stale = temp_dir
            .path()
            .join("train")
            .join("Organic")
            .join("stale.png");
        fs::write(&stale, b"junk").unwrap();

        curator.curate(&[source]).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn test_idempotent_counts_on_repeated_input() {
        let temp_dir = TempDir::new().unwrap();
        let raw = temp_dir.path().join("raw");
        write_images(&raw, "compost", 7);
        write_images(&raw, "glass", 9);

        let curator = curator_in(&temp_dir);
        let source = RawSource::from_directory(&raw).unwrap();
        let first = curator.curate(&[source.clone()]).unwrap();
        let second = curator.curate(&[source]).unwrap();

        for category in Category::ALL {
            for split in Split::ALL {
                assert_eq!(first.count(category, split), second.count(category, split));
            }
        }
    }

    #[test]
    fn test_identical_filenames_across_sources() {
        let temp_dir = TempDir::new().unwrap();
        let raw_a = temp_dir.path().join("raw_a");
        let raw_b = temp_dir.path().join("raw_b");
        write_images(&raw_a, "paper", 3);
        write_images(&raw_b, "paper", 3);

        let sources = [
            RawSource::from_directory(&raw_a).unwrap(),
            RawSource::from_directory(&raw_b).unwrap(),
        ];
        let report = curator_in(&temp_dir).curate(&sources).unwrap();

        // Both sources contribute img0.png..img2.png; all six must survive.
        assert_eq!(report.total(), 6);
    }

    #[test]
    fn test_materialised_files_match_counts() {
        let temp_dir = TempDir::new().unwrap();
        let raw = temp_dir.path().join("raw");
        write_images(&raw, "metal", 5);

        let source = RawSource::from_directory(&raw).unwrap();
        let report = curator_in(&temp_dir).curate(&[source]).unwrap();

        let train_files = fs::read_dir(temp_dir.path().join("train").join("Recyclable"))
            .unwrap()
            .count();
        assert_eq!(train_files, report.count(Category::Recyclable, Split::Train));
    }
}
