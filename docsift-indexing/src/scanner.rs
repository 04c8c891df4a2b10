//! Enumerate candidate files under a source directory
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use docsift_core::{IndexingError, IndexingResult};
use tracing::{debug, instrument};

use crate::{IgnoreSet, loaders::LoaderRegistry};

/// The `CorpusScanner` recursively walks a source directory and returns every file whose
/// extension is registered, minus the files already in the index.
///
/// Hidden files and directories are skipped. Ignore files such as `.gitignore` are not honoured:
/// every supported file under the root is a candidate.
///
/// Paths are returned joined onto the root exactly as given, so they compare equal to the
/// `source` metadata the loaders record for them.
#[derive(Debug, Clone)]
pub struct CorpusScanner {
    registry: Arc<LoaderRegistry>,
}

impl Default for CorpusScanner {
    fn default() -> Self {
        Self::new(LoaderRegistry::global().clone())
    }
}

impl CorpusScanner {
    pub fn new(registry: impl Into<Arc<LoaderRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    /// Lists supported files under `root` that are not in `already_indexed`.
    ///
    /// The output is sorted so repeated scans of an unchanged tree are identical.
    ///
    /// # Errors
    ///
    /// Returns [`IndexingError::Config`] if `root` is not a directory.
    #[instrument(name = "indexing.scan", skip_all, fields(root = %root.display()))]
    pub fn scan(&self, root: &Path, already_indexed: &IgnoreSet) -> IndexingResult<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(IndexingError::config(format!(
                "source directory {} does not exist or is not a directory",
                root.display()
            )));
        }

        let mut files = ignore::WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(true)
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(error = %err, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(ignore::DirEntry::into_path)
            .filter(|path| self.registry.supports_path(path))
            .filter(|path| {
                let indexed = already_indexed.contains(&path.to_string_lossy());
                if indexed {
                    debug!(path = %path.display(), "Skipping already indexed file");
                }
                !indexed
            })
            .collect::<Vec<_>>();

        files.sort();
        debug!(files = files.len(), "Scan complete");

        Ok(files)
    }
}
