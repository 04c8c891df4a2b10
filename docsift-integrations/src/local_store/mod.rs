//! A vector store persisted to a local directory
//!
//! The directory follows the default [`IndexLayout`]:
//!
//! ```text
//! vector_db/
//! ├── collection.json   name, settings, dimensions and entry count
//! ├── entries.json      content and metadata per entry, in vector order
//! └── index/
//!     ├── header.bin    magic, format version, dimensions, count
//!     ├── ids.bin       16 byte UUID per entry
//!     └── vectors.bin   little endian f32 rows
//! ```
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context as _, Result, ensure};
use async_trait::async_trait;
use derive_builder::Builder;
use docsift_core::{
    EmbeddingModel, IndexHandle, IndexSettings, VectorStore,
    indexing::{COLLECTION_MANIFEST, Document, ENTRIES_MANIFEST, IndexLayout},
};

mod format;
mod persist;

use format::{CollectionManifest, Header, StoredEntry};
pub use persist::LocalIndex;

const DEFAULT_COLLECTION_NAME: &str = "docsift";
const DEFAULT_BATCH_SIZE: usize = 256;

/// Stores chunks and their embeddings in a directory on disk.
///
/// Building or opening returns a [`LocalIndex`] that keeps everything in memory until
/// [`IndexHandle::persist`] writes it back. Only one writer per directory is supported.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(error = "anyhow::Error"))]
pub struct LocalStore {
    /// Directory holding the index
    persist_directory: PathBuf,
    /// Name recorded in the collection manifest
    #[builder(default = "DEFAULT_COLLECTION_NAME.to_string()")]
    collection_name: String,
    /// Number of chunks embedded per call to the embedding model
    #[builder(default = "DEFAULT_BATCH_SIZE")]
    batch_size: usize,
}

impl LocalStore {
    pub fn builder() -> LocalStoreBuilder {
        LocalStoreBuilder::default()
    }

    /// A store in `persist_directory` with default settings.
    pub fn new(persist_directory: impl Into<PathBuf>) -> Self {
        Self {
            persist_directory: persist_directory.into(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn persist_directory(&self) -> &Path {
        &self.persist_directory
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The layout this store writes, for use with an index state inspector.
    pub fn layout(&self) -> IndexLayout {
        IndexLayout::default()
    }

    pub(crate) fn index_dir(&self) -> PathBuf {
        self.persist_directory.join(self.layout().index_dir)
    }
}

#[async_trait]
impl VectorStore for LocalStore {
    #[tracing::instrument(skip_all, fields(path = %self.persist_directory.display()))]
    async fn open(&self, embedder: Arc<dyn EmbeddingModel>) -> Result<Box<dyn IndexHandle>> {
        let manifest: CollectionManifest =
            read_json(&self.persist_directory.join(COLLECTION_MANIFEST)).await?;
        let entries: Vec<StoredEntry> =
            read_json(&self.persist_directory.join(ENTRIES_MANIFEST)).await?;

        let index_dir = self.index_dir();
        let header = Header::decode(&fs_err::tokio::read(index_dir.join(format::HEADER_FILE)).await?)?;
        let ids = format::decode_ids(&fs_err::tokio::read(index_dir.join(format::IDS_FILE)).await?)?;
        let vectors = format::decode_vectors(
            &fs_err::tokio::read(index_dir.join(format::VECTORS_FILE)).await?,
            header.dimensions,
        )?;

        ensure!(
            manifest.count == entries.len()
                && header.count == entries.len()
                && ids.len() == entries.len()
                && vectors.len() == entries.len(),
            "Index at {} is inconsistent: manifest lists {} entries, found {} entries, {} ids and {} vectors",
            self.persist_directory.display(),
            manifest.count,
            entries.len(),
            ids.len(),
            vectors.len()
        );
        ensure!(
            entries.iter().zip(&ids).all(|(entry, id)| entry.id == *id),
            "Index at {} is inconsistent: ids do not match entries",
            self.persist_directory.display()
        );

        tracing::debug!(entries = entries.len(), "Opened local index");

        Ok(Box::new(LocalIndex::new(
            self.clone(),
            embedder,
            manifest.settings,
            entries,
            vectors,
        )))
    }

    #[tracing::instrument(skip_all, fields(path = %self.persist_directory.display(), chunks = chunks.len()))]
    async fn build_from(
        &self,
        chunks: Vec<Document>,
        embedder: Arc<dyn EmbeddingModel>,
        settings: IndexSettings,
    ) -> Result<Box<dyn IndexHandle>> {
        let mut index = LocalIndex::new(
            self.clone(),
            embedder,
            Some(settings),
            Vec::new(),
            Vec::new(),
        );
        index.add_documents(chunks).await?;

        Ok(Box::new(index))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs_err::tokio::read(path).await?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}
