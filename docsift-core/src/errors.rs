use std::path::PathBuf;

use thiserror::Error;

pub type IndexingResult<T> = std::result::Result<T, IndexingError>;

/// Everything that can stop an ingestion run.
///
/// An index that exists on disk but is incomplete is not an error; the inspector reports it as
/// missing and the run builds a fresh one.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// No loader strategy is registered for the extension. The scanner never yields such files.
    #[error("unsupported file format: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("failed to load {}: {source:#}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The embedding model or the vector store failed. Nothing is persisted.
    #[error("store error: {0:#}")]
    Store(anyhow::Error),

    #[error("no new documents found in {} and no existing index to keep", source_dir.display())]
    NothingToIndex { source_dir: PathBuf },

    #[error("chunking produced no chunks from {documents} non-empty documents")]
    NoChunksProduced { documents: usize },
}

impl IndexingError {
    pub fn config(message: impl Into<String>) -> Self {
        IndexingError::Config(message.into())
    }

    pub fn load(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        IndexingError::Load {
            path: path.into(),
            source: source.into(),
        }
    }

    /// The file a load error is attributed to.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            IndexingError::Load { path, .. } => Some(path),
            _ => None,
        }
    }
}
