//! Load many files in parallel
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use docsift_core::{IndexingError, IndexingResult, indexing::Document};
use futures_util::{StreamExt as _, stream};
use tokio::task::{self, JoinError};
use tracing::{instrument, warn};

use crate::{
    config::FailurePolicy,
    loaders::DocumentLoader,
    progress::{ProgressReporter, TracingProgress},
};

/// A file that failed to load and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Documents of every loaded file, in completion order.
    pub documents: Vec<Document>,
    /// Files that loaded successfully, including those that yielded no documents.
    pub files_loaded: usize,
    /// Files skipped under [`FailurePolicy::SkipAndReport`]. Always empty under `Abort`.
    pub failures: Vec<LoadFailure>,
}

/// Fans a list of files out over a pool of blocking workers, one task per file.
///
/// Workers share nothing but the read-only loader. Results are collected as they complete, so the
/// order of the returned documents is not defined. Progress is reported once per completed file.
#[derive(Debug, Clone)]
pub struct IngestionCoordinator {
    loader: DocumentLoader,
    concurrency: usize,
    failure_policy: FailurePolicy,
    progress: Arc<dyn ProgressReporter>,
}

impl Default for IngestionCoordinator {
    fn default() -> Self {
        Self::new(DocumentLoader::default())
    }
}

impl IngestionCoordinator {
    /// Creates a coordinator with one worker per CPU and the abort policy.
    pub fn new(loader: DocumentLoader) -> Self {
        Self {
            loader,
            concurrency: num_cpus::get(),
            failure_policy: FailurePolicy::default(),
            progress: Arc::new(TracingProgress::default()),
        }
    }

    /// Sets the number of files loaded at the same time. Values below one are raised to one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Loads every file in `paths`.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`] the first failing file stops the batch: no further files are
    /// dispatched and the error is returned, naming the path. A worker that panics counts as a
    /// failure of the file it was loading.
    #[instrument(name = "indexing.load_all", skip_all, fields(files = paths.len()))]
    pub async fn load_all(&self, paths: Vec<PathBuf>) -> IndexingResult<LoadOutcome> {
        self.progress.start(paths.len());

        let mut completed = stream::iter(paths)
            .map(|path| {
                let loader = self.loader.clone();
                let task_path = path.clone();
                let handle = task::spawn_blocking(move || loader.load(&task_path));
                async move {
                    let result = handle
                        .await
                        .unwrap_or_else(|err| Err(worker_failed(&path, err)));
                    (path, result)
                }
            })
            .buffer_unordered(self.concurrency);

        let mut outcome = LoadOutcome::default();
        while let Some((path, result)) = completed.next().await {
            self.progress.file_done(&path);

            match result {
                Ok(documents) => {
                    outcome.files_loaded += 1;
                    outcome.documents.extend(documents);
                }
                Err(err) if self.failure_policy == FailurePolicy::SkipAndReport => {
                    warn!(path = %path.display(), error = %err, "Skipping file that failed to load");
                    outcome.failures.push(LoadFailure {
                        reason: failure_reason(&err),
                        path,
                    });
                }
                Err(err) => {
                    self.progress.finish();
                    return Err(err);
                }
            }
        }

        self.progress.finish();
        Ok(outcome)
    }
}

fn worker_failed(path: &Path, err: JoinError) -> IndexingError {
    IndexingError::load(path, anyhow::Error::new(err).context("loader task did not complete"))
}

fn failure_reason(err: &IndexingError) -> String {
    match err {
        IndexingError::Load { source, .. } => format!("{source:#}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::LoaderRegistry;
    use crate::progress::MockProgressReporter;
    use temp_dir::TempDir;

    fn write(root: &Path, name: &str, content: &str) -> PathBuf {
        let path = root.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn counting_progress(files: usize) -> Arc<MockProgressReporter> {
        let mut progress = MockProgressReporter::new();
        progress
            .expect_start()
            .withf(move |total| *total == files)
            .times(1)
            .return_const(());
        progress.expect_file_done().times(files).return_const(());
        progress.expect_finish().times(1).return_const(());
        Arc::new(progress)
    }

    #[test_log::test(tokio::test)]
    async fn test_loads_all_files() {
        let temp = TempDir::new().unwrap();
        let paths = vec![
            write(temp.path(), "a.txt", "alpha"),
            write(temp.path(), "b.md", "beta"),
            write(temp.path(), "c.txt", "gamma"),
        ];

        let coordinator = IngestionCoordinator::default()
            .with_concurrency(2)
            .with_progress(counting_progress(3));
        let outcome = coordinator.load_all(paths).await.unwrap();

        let mut contents: Vec<_> = outcome
            .documents
            .iter()
            .map(|doc| doc.content.as_str())
            .collect();
        contents.sort_unstable();

        assert_eq!(contents, vec!["alpha", "beta", "gamma"]);
        assert_eq!(outcome.files_loaded, 3);
        assert!(outcome.failures.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_empty_batch() {
        let coordinator = IngestionCoordinator::default().with_progress(counting_progress(0));
        let outcome = coordinator.load_all(Vec::new()).await.unwrap();

        assert!(outcome.documents.is_empty());
        assert_eq!(outcome.files_loaded, 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_abort_on_first_failure() {
        let temp = TempDir::new().unwrap();
        let broken = write(temp.path(), "broken.pdf", "not a pdf");

        let coordinator = IngestionCoordinator::default().with_concurrency(1);
        let err = coordinator
            .load_all(vec![broken.clone(), write(temp.path(), "a.txt", "alpha")])
            .await
            .unwrap_err();

        assert_eq!(err.path(), Some(broken.as_path()));
    }

    #[test_log::test(tokio::test)]
    async fn test_skip_and_report() {
        let temp = TempDir::new().unwrap();
        let broken = write(temp.path(), "broken.pdf", "not a pdf");
        let paths = vec![
            write(temp.path(), "a.txt", "alpha"),
            broken.clone(),
            write(temp.path(), "b.txt", "beta"),
        ];

        let coordinator = IngestionCoordinator::default()
            .with_failure_policy(FailurePolicy::SkipAndReport)
            .with_progress(counting_progress(3));
        let outcome = coordinator.load_all(paths).await.unwrap();

        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.files_loaded, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].path, broken);
        assert!(!outcome.failures[0].reason.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_panicking_worker_is_attributed_to_its_file() {
        let path = PathBuf::from("my_pdfs/cursed.pdf");
        let join_error = task::spawn_blocking(|| -> usize { panic!("malformed cross reference table") })
            .await
            .unwrap_err();

        let err = worker_failed(&path, join_error);

        assert!(matches!(err, IndexingError::Load { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
        assert!(failure_reason(&err).contains("loader task did not complete"));
    }

    #[test_log::test(tokio::test)]
    async fn test_progress_counts_files_not_documents() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("pages.pdf");
        crate::loaders::pdf::tests::write_pdf(&pdf, &["one", "two", "three"], None);

        let coordinator = IngestionCoordinator::new(DocumentLoader::new(LoaderRegistry::pdf_only()))
            .with_progress(counting_progress(1));
        let outcome = coordinator.load_all(vec![pdf]).await.unwrap();

        assert_eq!(outcome.documents.len(), 3);
        assert_eq!(outcome.files_loaded, 1);
    }
}
