use std::{path::Path, sync::Arc};

use docsift_core::{IndexingError, IndexingResult, indexing::Document};
use tracing::debug;

use super::LoaderRegistry;

/// Loads a single file into documents using the strategy registered for its extension.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    registry: Arc<LoaderRegistry>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(LoaderRegistry::global().clone())
    }
}

impl DocumentLoader {
    pub fn new(registry: impl Into<Arc<LoaderRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Loads the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexingError::UnsupportedFormat`] if no strategy is registered for the
    /// extension, and [`IndexingError::Load`] naming `path` if the strategy fails.
    pub fn load(&self, path: &Path) -> IndexingResult<Vec<Document>> {
        let strategy = self.registry.resolve_path(path)?;
        debug!(path = %path.display(), %strategy, "Loading file");

        strategy
            .load(path)
            .map_err(|err| IndexingError::load(path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::{LoaderStrategy, TextOptions};
    use temp_dir::TempDir;

    #[test]
    fn test_load_attributes_failures_to_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        std::fs::write(&path, "not a pdf").unwrap();

        let err = DocumentLoader::default().load(&path).unwrap_err();

        assert_eq!(err.path(), Some(path.as_path()));
        assert!(err.to_string().starts_with("failed to load"));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let loader = DocumentLoader::new(LoaderRegistry::pdf_only());
        let err = loader.load(Path::new("notes.txt")).unwrap_err();

        assert!(matches!(err, IndexingError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_load_with_custom_registry() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.csv");
        std::fs::write(&path, "a,b\n1,2").unwrap();

        let registry =
            LoaderRegistry::empty().with_entry("csv", LoaderStrategy::Text(TextOptions::default()));
        let documents = DocumentLoader::new(registry).load(&path).unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "a,b\n1,2");
    }
}
