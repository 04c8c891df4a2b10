//! Progress reporting while files are loaded
use std::{
    fmt::Debug,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Receives one `file_done` per completed file, whether the file produced documents, produced
/// none, or failed and was skipped. Calls come from the coordinating task, in completion order.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressReporter: Send + Sync + Debug {
    fn start(&self, total: usize);
    fn file_done(&self, path: &Path);
    fn finish(&self);
}

/// Logs progress at debug level. Used when no other reporter is configured.
#[derive(Debug, Default)]
pub struct TracingProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl TracingProgress {
    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for TracingProgress {
    fn start(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        tracing::debug!(total, "Loading new documents");
    }

    fn file_done(&self, path: &Path) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total.load(Ordering::Relaxed);
        tracing::debug!(done, total, path = %path.display(), "Loaded file");
    }

    fn finish(&self) {
        tracing::debug!(done = self.done(), "Finished loading");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_progress_counts() {
        let progress = TracingProgress::default();
        progress.start(2);
        progress.file_done(Path::new("a.pdf"));
        progress.file_done(Path::new("b.pdf"));
        progress.finish();

        assert_eq!(progress.done(), 2);

        progress.start(1);
        assert_eq!(progress.done(), 0);
    }
}
