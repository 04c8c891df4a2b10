//! Decide whether a persist directory holds a complete index
use std::path::Path;

use docsift_core::indexing::IndexLayout;
use tracing::debug;

/// Checks a persist directory against an [`IndexLayout`].
///
/// An index exists only if the index subdirectory exists, every manifest exists, and the index
/// subdirectory holds at least `min_data_files` data files. Anything less, including unreadable
/// directories, counts as no index: a fresh one is built instead of appending to a partial one.
#[derive(Debug, Clone, Default)]
pub struct IndexStateInspector {
    layout: IndexLayout,
}

impl IndexStateInspector {
    pub fn new(layout: IndexLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &IndexLayout {
        &self.layout
    }

    pub fn exists(&self, persist_dir: &Path) -> bool {
        let index_dir = persist_dir.join(&self.layout.index_dir);
        if !index_dir.is_dir() {
            debug!(path = %index_dir.display(), "No index directory");
            return false;
        }

        if let Some(missing) = self
            .layout
            .manifests
            .iter()
            .find(|manifest| !persist_dir.join(manifest).is_file())
        {
            debug!(manifest = %missing, "Index manifest missing");
            return false;
        }

        let data_files = self.count_data_files(&index_dir);
        if data_files < self.layout.min_data_files {
            debug!(
                data_files,
                required = self.layout.min_data_files,
                "Not enough index data files"
            );
            return false;
        }

        true
    }

    fn count_data_files(&self, index_dir: &Path) -> usize {
        let Ok(entries) = fs_err::read_dir(index_dir) else {
            return 0;
        };

        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| self.layout.is_data_extension(&ext.to_string_lossy()))
            })
            .count()
    }
}

/// Checks `persist_dir` against the default layout.
pub fn exists(persist_dir: &Path) -> bool {
    IndexStateInspector::default().exists(persist_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::indexing::{COLLECTION_MANIFEST, ENTRIES_MANIFEST};
    use temp_dir::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    fn complete_index(root: &Path) {
        touch(&root.join(COLLECTION_MANIFEST));
        touch(&root.join(ENTRIES_MANIFEST));
        for name in ["header.bin", "ids.bin", "vectors.bin"] {
            touch(&root.join("index").join(name));
        }
    }

    #[test]
    fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        assert!(!exists(temp.path()));
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        assert!(!exists(&temp.path().join("vector_db")));
    }

    #[test]
    fn test_index_dir_without_manifests() {
        let temp = TempDir::new().unwrap();
        for name in ["header.bin", "ids.bin", "vectors.bin"] {
            touch(&temp.path().join("index").join(name));
        }
        assert!(!exists(temp.path()));
    }

    #[test]
    fn test_manifests_without_enough_data_files() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join(COLLECTION_MANIFEST));
        touch(&temp.path().join(ENTRIES_MANIFEST));
        touch(&temp.path().join("index/header.bin"));
        touch(&temp.path().join("index/ids.bin"));
        touch(&temp.path().join("index/notes.txt"));

        assert!(!exists(temp.path()));
    }

    #[test]
    fn test_one_manifest_missing() {
        let temp = TempDir::new().unwrap();
        complete_index(temp.path());
        std::fs::remove_file(temp.path().join(ENTRIES_MANIFEST)).unwrap();

        assert!(!exists(temp.path()));
    }

    #[test]
    fn test_complete_index() {
        let temp = TempDir::new().unwrap();
        complete_index(temp.path());
        assert!(exists(temp.path()));
    }

    #[test]
    fn test_custom_layout() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("chroma-collections.parquet"));
        touch(&temp.path().join("chroma-embeddings.parquet"));
        touch(&temp.path().join("index/a.bin"));
        touch(&temp.path().join("index/b.bin"));
        touch(&temp.path().join("index/c.pkl"));

        let layout = IndexLayout::builder()
            .manifests(vec![
                "chroma-collections.parquet".to_string(),
                "chroma-embeddings.parquet".to_string(),
            ])
            .data_extensions(vec!["bin".to_string(), "pkl".to_string()])
            .build()
            .unwrap();

        assert!(IndexStateInspector::new(layout).exists(temp.path()));
        assert!(!exists(temp.path()));
    }
}
