use std::sync::Arc;

use anyhow::{Result, ensure};
use async_trait::async_trait;
use docsift_core::{
    Embedding, EmbeddingModel, IndexHandle, IndexSettings, VectorStore,
    indexing::{Document, Metadata},
};
use tokio::sync::RwLock;

/// A simple in-memory vector store.
///
/// Great for experimentation and testing. Clones share the same data. Changes made through a
/// handle only become visible to the store, and to handles opened later, once persisted.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<Committed>>,
}

#[derive(Debug, Default, Clone)]
struct Committed {
    settings: Option<IndexSettings>,
    entries: Vec<(Document, Embedding)>,
    persist_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings of the last persisted index
    pub async fn settings(&self) -> Option<IndexSettings> {
        self.state.read().await.settings.clone()
    }

    /// All persisted documents, in insertion order
    pub async fn documents(&self) -> Vec<Document> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .map(|(document, _)| document.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Number of times any handle persisted
    pub async fn persist_count(&self) -> usize {
        self.state.read().await.persist_count
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn open(&self, embedder: Arc<dyn EmbeddingModel>) -> Result<Box<dyn IndexHandle>> {
        let committed = self.state.read().await.clone();

        Ok(Box::new(MemoryIndex {
            store: self.clone(),
            embedder,
            settings: committed.settings,
            entries: committed.entries,
        }))
    }

    async fn build_from(
        &self,
        chunks: Vec<Document>,
        embedder: Arc<dyn EmbeddingModel>,
        settings: IndexSettings,
    ) -> Result<Box<dyn IndexHandle>> {
        let mut index = MemoryIndex {
            store: self.clone(),
            embedder,
            settings: Some(settings),
            entries: Vec::new(),
        };
        index.add_documents(chunks).await?;

        Ok(Box::new(index))
    }
}

#[derive(Debug)]
struct MemoryIndex {
    store: MemoryStore,
    embedder: Arc<dyn EmbeddingModel>,
    settings: Option<IndexSettings>,
    entries: Vec<(Document, Embedding)>,
}

#[async_trait]
impl IndexHandle for MemoryIndex {
    fn settings(&self) -> Option<IndexSettings> {
        self.settings.clone()
    }

    async fn get_all_metadata(&self) -> Result<Vec<Metadata>> {
        Ok(self
            .entries
            .iter()
            .map(|(document, _)| document.metadata.clone())
            .collect())
    }

    async fn add_documents(&mut self, chunks: Vec<Document>) -> Result<usize> {
        let chunks = chunks
            .into_iter()
            .filter(|chunk| {
                let id = chunk.id();
                !self.entries.iter().any(|(existing, _)| existing.id() == id)
            })
            .collect::<Vec<_>>();
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self
            .embedder
            .embed(chunks.iter().map(|chunk| chunk.content.clone()).collect())
            .await?;
        ensure!(
            embeddings.len() == chunks.len(),
            "Embedding model returned {} embeddings for {} chunks",
            embeddings.len(),
            chunks.len()
        );

        let added = chunks.len();
        self.entries.extend(chunks.into_iter().zip(embeddings));
        Ok(added)
    }

    async fn persist(&mut self) -> Result<()> {
        let mut committed = self.store.state.write().await;
        committed.settings.clone_from(&self.settings);
        committed.entries.clone_from(&self.entries);
        committed.persist_count += 1;
        Ok(())
    }
}
