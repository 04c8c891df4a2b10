use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context as _, Result, bail, ensure};
use async_trait::async_trait;
use docsift_core::{
    Embedding, EmbeddingModel, IndexHandle, IndexSettings,
    indexing::{COLLECTION_MANIFEST, Document, ENTRIES_MANIFEST, Metadata},
};
use uuid::Uuid;

use super::{
    LocalStore,
    format::{self, CollectionManifest, FORMAT_VERSION, Header, StoredEntry},
};

/// An opened [`LocalStore`] index.
///
/// Entries and vectors are held in memory. Nothing reaches the disk until `persist`.
#[derive(Debug)]
pub struct LocalIndex {
    store: LocalStore,
    embedder: Arc<dyn EmbeddingModel>,
    settings: Option<IndexSettings>,
    entries: Vec<StoredEntry>,
    vectors: Vec<Embedding>,
    known_ids: HashSet<Uuid>,
}

impl LocalIndex {
    pub(crate) fn new(
        store: LocalStore,
        embedder: Arc<dyn EmbeddingModel>,
        settings: Option<IndexSettings>,
        entries: Vec<StoredEntry>,
        vectors: Vec<Embedding>,
    ) -> Self {
        let known_ids = entries.iter().map(|entry| entry.id).collect();
        Self {
            store,
            embedder,
            settings,
            entries,
            vectors,
            known_ids,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn dimensions(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }

    async fn embed_batch(&self, batch: &[Document]) -> Result<Vec<Embedding>> {
        let embeddings = self
            .embedder
            .embed(batch.iter().map(|chunk| chunk.content.clone()).collect())
            .await?;

        ensure!(
            embeddings.len() == batch.len(),
            "Embedding model returned {} embeddings for {} chunks",
            embeddings.len(),
            batch.len()
        );
        Ok(embeddings)
    }
}

#[async_trait]
impl IndexHandle for LocalIndex {
    fn settings(&self) -> Option<IndexSettings> {
        self.settings.clone()
    }

    async fn get_all_metadata(&self) -> Result<Vec<Metadata>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| entry.metadata.clone())
            .collect())
    }

    /// Embeds new chunks in batches and appends them. Chunks whose id is already present are
    /// skipped.
    #[tracing::instrument(skip_all, fields(chunks = chunks.len()))]
    async fn add_documents(&mut self, chunks: Vec<Document>) -> Result<usize> {
        let mut seen = self.known_ids.clone();
        let chunks = chunks
            .into_iter()
            .filter(|chunk| seen.insert(chunk.id()))
            .collect::<Vec<_>>();

        let batch_size = self.store.batch_size().max(1);
        let mut new_entries = Vec::with_capacity(chunks.len());
        let mut new_vectors = Vec::with_capacity(chunks.len());
        let mut dimensions = self.dimensions();

        for batch in chunks.chunks(batch_size) {
            let embeddings = self.embed_batch(batch).await?;

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                if embedding.is_empty() {
                    bail!("Embedding model returned an empty embedding");
                }
                match dimensions {
                    Some(expected) if expected != embedding.len() => bail!(
                        "Embedding has {} dimensions but the index uses {expected}",
                        embedding.len()
                    ),
                    Some(_) => {}
                    None => dimensions = Some(embedding.len()),
                }

                new_entries.push(StoredEntry {
                    id: chunk.id(),
                    document: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                    offset: chunk.offset,
                    original_size: chunk.original_size,
                });
                new_vectors.push(embedding);
            }
            tracing::debug!(embedded = new_entries.len(), total = chunks.len(), "Embedded batch");
        }

        let added = new_entries.len();
        self.known_ids.extend(new_entries.iter().map(|entry| entry.id));
        self.entries.extend(new_entries);
        self.vectors.extend(new_vectors);

        Ok(added)
    }

    /// Writes every file to a temporary sibling and renames it into place.
    ///
    /// The collection manifest is removed before anything else is replaced and written last, so an
    /// interrupted persist leaves a directory without one. Such a directory does not count as an
    /// existing index and gets rebuilt by the next run.
    #[tracing::instrument(skip_all, fields(path = %self.store.persist_directory().display()))]
    async fn persist(&mut self) -> Result<()> {
        let root = self.store.persist_directory().to_path_buf();
        let index_dir = self.store.index_dir();
        fs_err::tokio::create_dir_all(&index_dir).await?;

        let dimensions = self.dimensions().unwrap_or_default();
        let ids = self.entries.iter().map(|entry| entry.id).collect::<Vec<_>>();
        let header = Header {
            dimensions,
            count: self.entries.len(),
        };
        let manifest = CollectionManifest {
            format_version: FORMAT_VERSION,
            name: self.store.collection_name().to_string(),
            settings: self.settings.clone(),
            dimensions,
            count: self.entries.len(),
        };

        let manifest_path = root.join(COLLECTION_MANIFEST);
        remove_if_exists(&manifest_path).await?;

        write_replace(
            &index_dir.join(format::VECTORS_FILE),
            &format::encode_vectors(&self.vectors),
        )
        .await?;
        write_replace(&index_dir.join(format::IDS_FILE), &format::encode_ids(&ids)).await?;
        write_replace(&index_dir.join(format::HEADER_FILE), &header.encode()?).await?;
        write_replace(
            &root.join(ENTRIES_MANIFEST),
            &serde_json::to_vec(&self.entries)?,
        )
        .await?;
        write_replace(&manifest_path, &serde_json::to_vec_pretty(&manifest)?).await?;

        tracing::info!(entries = self.entries.len(), "Persisted local index");
        Ok(())
    }
}

async fn write_replace(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    fs_err::tokio::write(&tmp, contents).await?;
    fs_err::tokio::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move {} into place", path.display()))
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs_err::tokio::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
