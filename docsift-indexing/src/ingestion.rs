//! Drive a complete ingestion run
//!
//! A run decides once whether to create a new index or append to an existing one, then scans,
//! loads and chunks the source directory and commits the chunks to the store. In append mode the
//! sources already in the index are skipped, so only new files are loaded and embedded.
use std::sync::Arc;

use derive_builder::Builder;
use docsift_core::{
    EmbeddingModel, IndexHandle, IndexSettings, IndexingError, IndexingResult, VectorStore,
};
use tracing::{debug, info, instrument};

use crate::{
    IgnoreSet,
    config::IngestConfig,
    coordinator::{IngestionCoordinator, LoadFailure},
    index_state::IndexStateInspector,
    loaders::{DocumentLoader, LoaderRegistry},
    progress::{ProgressReporter, TracingProgress},
    scanner::CorpusScanner,
    transformers::ChunkText,
};

/// Which of the two paths a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum IngestMode {
    /// No valid index existed; a new one was built from every source file.
    Create,
    /// A valid index existed; only files not yet in it were added.
    Append,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionReport {
    pub mode: IngestMode,
    /// Files found by the scan, after excluding already indexed sources.
    pub files_scanned: usize,
    pub documents_loaded: usize,
    pub chunks_added: usize,
    /// Files skipped because they failed to load. Only populated under the skip policy.
    pub failures: Vec<LoadFailure>,
}

/// An ingestion run over a source directory into a vector store.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use docsift_indexing::{Ingestion, IngestConfig, persist::MemoryStore};
/// # async fn run(embedder: Arc<dyn docsift_core::EmbeddingModel>) -> anyhow::Result<()> {
/// let report = Ingestion::builder()
///     .config(IngestConfig::default())
///     .store(Arc::new(MemoryStore::new()))
///     .embedder(embedder)
///     .build()?
///     .run()
///     .await?;
///
/// println!("{} chunks added", report.chunks_added);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Builder)]
#[builder(pattern = "owned", build_fn(error = "anyhow::Error"))]
pub struct Ingestion {
    #[builder(setter(into))]
    config: IngestConfig,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingModel>,
    #[builder(default = "Arc::new(LoaderRegistry::global().clone())")]
    registry: Arc<LoaderRegistry>,
    #[builder(default)]
    inspector: IndexStateInspector,
    #[builder(default = "Arc::new(TracingProgress::default())")]
    progress: Arc<dyn ProgressReporter>,
}

impl Ingestion {
    pub fn builder() -> IngestionBuilder {
        IngestionBuilder::default()
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Runs the ingestion.
    ///
    /// # Errors
    ///
    /// - [`IndexingError::Config`] for invalid parameters (checked before any I/O), a missing
    ///   source directory, or an existing index built with different settings.
    /// - [`IndexingError::Load`] if a file fails to load under the abort policy.
    /// - [`IndexingError::NothingToIndex`] if no index exists and nothing could be indexed.
    /// - [`IndexingError::NoChunksProduced`] if non-empty documents produced no chunks.
    /// - [`IndexingError::Store`] if opening, embedding or persisting fails.
    ///
    /// On any error nothing is persisted.
    #[instrument(
        name = "indexing.run",
        skip_all,
        fields(
            source = %self.config.source_directory.display(),
            persist = %self.config.persist_directory.display(),
        )
    )]
    pub async fn run(&self) -> IndexingResult<IngestionReport> {
        self.config.validate()?;
        let chunker = ChunkText::from_config(&self.config)?;
        let settings = self.config.index_settings();

        let source_dir = &self.config.source_directory;
        let persist_dir = &self.config.persist_directory;

        let (existing, ignore) = if self.inspector.exists(persist_dir) {
            info!("Appending to existing index at {}", persist_dir.display());
            let handle = self
                .store
                .open(Arc::clone(&self.embedder))
                .await
                .map_err(IndexingError::Store)?;
            check_settings(handle.as_ref(), &settings)?;

            let metadata = handle
                .get_all_metadata()
                .await
                .map_err(IndexingError::Store)?;
            let ignore = IgnoreSet::from_metadata(&metadata);
            debug!(
                entries = metadata.len(),
                sources = ignore.len(),
                "Collected indexed sources"
            );

            (Some(handle), ignore)
        } else {
            info!("Creating new index");
            (None, IgnoreSet::default())
        };

        info!("Loading documents from {}", source_dir.display());
        let files = CorpusScanner::new(Arc::clone(&self.registry)).scan(source_dir, &ignore)?;
        let files_scanned = files.len();

        let outcome = self.coordinator().load_all(files).await?;
        let documents_loaded = outcome.documents.len();
        info!(
            "Loaded {documents_loaded} new documents from {}",
            source_dir.display()
        );

        let chunks = chunker.split(&outcome.documents);
        info!(
            "Split into {} chunks of text (max. {} characters each)",
            chunks.len(),
            chunker.chunk_size()
        );

        let non_blank = outcome.documents.iter().filter(|doc| !doc.is_blank()).count();
        if chunks.is_empty() && non_blank > 0 {
            return Err(IndexingError::NoChunksProduced {
                documents: non_blank,
            });
        }

        let (mode, chunks_added) = match existing {
            Some(mut handle) => {
                let added = if chunks.is_empty() {
                    info!("No new documents to add");
                    0
                } else {
                    info!("Creating embeddings. May take some minutes...");
                    handle
                        .add_documents(chunks)
                        .await
                        .map_err(IndexingError::Store)?
                };
                handle.persist().await.map_err(IndexingError::Store)?;

                (IngestMode::Append, added)
            }
            None => {
                if chunks.is_empty() {
                    return Err(IndexingError::NothingToIndex {
                        source_dir: source_dir.clone(),
                    });
                }

                info!("Creating embeddings. May take some minutes...");
                let count = chunks.len();
                let mut handle = self
                    .store
                    .build_from(chunks, Arc::clone(&self.embedder), settings)
                    .await
                    .map_err(IndexingError::Store)?;
                handle.persist().await.map_err(IndexingError::Store)?;

                (IngestMode::Create, count)
            }
        };

        info!("Index persisted at {}", persist_dir.display());

        Ok(IngestionReport {
            mode,
            files_scanned,
            documents_loaded,
            chunks_added,
            failures: outcome.failures,
        })
    }

    fn coordinator(&self) -> IngestionCoordinator {
        IngestionCoordinator::new(DocumentLoader::new(Arc::clone(&self.registry)))
            .with_concurrency(self.config.concurrency)
            .with_failure_policy(self.config.failure_policy)
            .with_progress(Arc::clone(&self.progress))
    }
}

/// Fails if the index records settings that differ from this run's.
fn check_settings(handle: &dyn IndexHandle, expected: &IndexSettings) -> IndexingResult<()> {
    match handle.settings() {
        Some(recorded) if &recorded != expected => Err(IndexingError::config(format!(
            "existing index was built with model {:?}, chunk_size {} and chunk_overlap {}, but \
             this run uses model {:?}, chunk_size {} and chunk_overlap {}",
            recorded.embedding_model,
            recorded.chunk_size,
            recorded.chunk_overlap,
            expected.embedding_model,
            expected.chunk_size,
            expected.chunk_overlap,
        ))),
        _ => Ok(()),
    }
}
