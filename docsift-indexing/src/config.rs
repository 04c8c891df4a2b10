//! Configuration for an ingestion run
//!
//! All values are checked by [`IngestConfig::validate`], which the builder runs on `build()` and
//! the orchestrator runs again before touching the filesystem.
use std::path::PathBuf;

use derive_builder::Builder;
use docsift_core::{IndexSettings, IndexingError, IndexingResult};

pub const DEFAULT_SOURCE_DIRECTORY: &str = "my_pdfs";
pub const DEFAULT_PERSIST_DIRECTORY: &str = "vector_db";
pub const DEFAULT_EMBEDDINGS_MODEL_NAME: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 256;

/// What to do when a single file fails to load.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FailurePolicy {
    /// The first failure aborts the batch and nothing is committed.
    #[default]
    Abort,
    /// Failed files are logged, reported and left out of the index. A later run retries them.
    #[strum(to_string = "skip", serialize = "skip_and_report")]
    SkipAndReport,
}

/// How documents are cut into chunks.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SplitMode {
    /// Prefer paragraph, then sentence, then word boundaries, with exact overlap.
    #[default]
    Recursive,
    /// Semantic levels from `text-splitter`; overlap is an upper bound.
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(
    setter(into),
    build_fn(error = "anyhow::Error", validate = "Self::validate")
)]
pub struct IngestConfig {
    /// Directory scanned for source files.
    #[builder(default = "PathBuf::from(DEFAULT_SOURCE_DIRECTORY)")]
    pub source_directory: PathBuf,
    /// Directory holding the persisted index.
    #[builder(default = "PathBuf::from(DEFAULT_PERSIST_DIRECTORY)")]
    pub persist_directory: PathBuf,
    /// Identifier of the embedding model, recorded with the index.
    #[builder(default = "DEFAULT_EMBEDDINGS_MODEL_NAME.to_string()")]
    pub embeddings_model_name: String,
    /// Maximum chunk length in characters.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks. Must be smaller than `chunk_size`.
    #[builder(default = "DEFAULT_CHUNK_OVERLAP")]
    pub chunk_overlap: usize,
    /// Number of files loaded concurrently.
    #[builder(default = "num_cpus::get()")]
    pub concurrency: usize,
    #[builder(default)]
    pub failure_policy: FailurePolicy,
    #[builder(default)]
    pub split_mode: SplitMode,
    /// Number of chunks sent to the embedding model at once.
    #[builder(default = "DEFAULT_EMBED_BATCH_SIZE")]
    pub embed_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from(DEFAULT_SOURCE_DIRECTORY),
            persist_directory: PathBuf::from(DEFAULT_PERSIST_DIRECTORY),
            embeddings_model_name: DEFAULT_EMBEDDINGS_MODEL_NAME.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            concurrency: num_cpus::get(),
            failure_policy: FailurePolicy::default(),
            split_mode: SplitMode::default(),
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }
}

impl IngestConfig {
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Checks the run parameters.
    ///
    /// # Errors
    ///
    /// Returns [`IndexingError::Config`] if the chunk size is zero, the overlap is not smaller
    /// than the chunk size, or the concurrency or batch size is zero.
    pub fn validate(&self) -> IndexingResult<()> {
        check_parameters(
            self.chunk_size,
            self.chunk_overlap,
            self.concurrency,
            self.embed_batch_size,
        )
    }

    /// The settings an index built with this configuration records.
    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings {
            embedding_model: self.embeddings_model_name.clone(),
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

impl IngestConfigBuilder {
    fn validate(&self) -> IndexingResult<()> {
        check_parameters(
            self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            self.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP),
            self.concurrency.unwrap_or(1),
            self.embed_batch_size.unwrap_or(DEFAULT_EMBED_BATCH_SIZE),
        )
    }
}

/// Validates chunk parameters on their own. Shared with the chunker.
pub(crate) fn check_chunk_parameters(chunk_size: usize, chunk_overlap: usize) -> IndexingResult<()> {
    if chunk_size == 0 {
        return Err(IndexingError::config("chunk_size must be greater than 0"));
    }
    if chunk_overlap >= chunk_size {
        return Err(IndexingError::config(format!(
            "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

fn check_parameters(
    chunk_size: usize,
    chunk_overlap: usize,
    concurrency: usize,
    embed_batch_size: usize,
) -> IndexingResult<()> {
    check_chunk_parameters(chunk_size, chunk_overlap)?;
    if concurrency == 0 {
        return Err(IndexingError::config("concurrency must be greater than 0"));
    }
    if embed_batch_size == 0 {
        return Err(IndexingError::config(
            "embed_batch_size must be greater than 0",
        ));
    }
    Ok(())
}
