//! On-disk layout of a persisted index.
//!
//! The layout is owned by the store that writes it. The index state inspector only reads it to
//! decide whether a persist directory holds a complete index.
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Name of the subdirectory holding the index data files.
pub const DEFAULT_INDEX_DIR: &str = "index";
/// Manifest describing the collection and its settings.
pub const COLLECTION_MANIFEST: &str = "collection.json";
/// Manifest holding per-entry content and metadata.
pub const ENTRIES_MANIFEST: &str = "entries.json";
/// A working index needs at least this many data files.
pub const DEFAULT_MIN_DATA_FILES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(error = "anyhow::Error"))]
pub struct IndexLayout {
    /// Subdirectory of the persist directory that holds the data files.
    #[builder(default = "DEFAULT_INDEX_DIR.to_string()")]
    pub index_dir: String,
    /// Files that must exist at the root of the persist directory.
    #[builder(default = "vec![COLLECTION_MANIFEST.to_string(), ENTRIES_MANIFEST.to_string()]")]
    pub manifests: Vec<String>,
    /// Extensions (without the dot) counted as data files inside the index subdirectory.
    #[builder(default = "vec![\"bin\".to_string()]")]
    pub data_extensions: Vec<String>,
    /// Minimum number of data files for the index to count as valid.
    #[builder(default = "DEFAULT_MIN_DATA_FILES")]
    pub min_data_files: usize,
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self {
            index_dir: DEFAULT_INDEX_DIR.to_string(),
            manifests: vec![
                COLLECTION_MANIFEST.to_string(),
                ENTRIES_MANIFEST.to_string(),
            ],
            data_extensions: vec!["bin".to_string()],
            min_data_files: DEFAULT_MIN_DATA_FILES,
        }
    }
}

impl IndexLayout {
    pub fn builder() -> IndexLayoutBuilder {
        IndexLayoutBuilder::default()
    }

    /// True if `extension` counts as a data file extension.
    pub fn is_data_extension(&self, extension: &str) -> bool {
        self.data_extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}
