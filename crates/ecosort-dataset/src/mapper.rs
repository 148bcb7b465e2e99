//! Mapping from raw source labels to the two canonical categories.

use ecosort_core::{Category, Error, Result};

/// Maps fine-grained source labels (e.g. "plastic", "compost") onto the
/// closed {Organic, Recyclable} set.
///
/// The table is fixed configuration data. Unknown labels are rejected
/// rather than defaulted: silently inferring a category would corrupt the
/// two-class boundary the whole pipeline assumes.
#[derive(Debug, Clone, Default)]
pub struct ClassMapper;

/// The canonical label table. Lookups are case-insensitive. The category
/// names themselves are included so the upload store (one directory per
/// category) is a valid raw source.
const LABEL_TABLE: &[(&str, Category)] = &[
    ("compost", Category::Organic),
    ("trash", Category::Organic),
    ("organic", Category::Organic),
    ("cardboard", Category::Recyclable),
    ("glass", Category::Recyclable),
    ("metal", Category::Recyclable),
    ("paper", Category::Recyclable),
    ("plastic", Category::Recyclable),
    ("recyclable", Category::Recyclable),
];

impl ClassMapper {
    pub fn new() -> Self {
        Self
    }

    /// Resolves a source label to its category, or fails with `UnknownLabel`.
    pub fn map(&self, source_label: &str) -> Result<Category> {
        let needle = source_label.to_lowercase();
        LABEL_TABLE
            .iter()
            .find(|(label, _)| *label == needle)
            .map(|(_, category)| *category)
            .ok_or_else(|| Error::UnknownLabel(source_label.to_string()))
    }

    /// All labels the mapper recognises.
    pub fn known_labels(&self) -> impl Iterator<Item = &'static str> {
        LABEL_TABLE.iter().map(|(label, _)| *label)
    }
}
