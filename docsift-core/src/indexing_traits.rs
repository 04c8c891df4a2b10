//! Seams between the ingestion core and its collaborators
//!
//! The core never embeds text or writes an index itself. It hands chunks to a [`VectorStore`],
//! which embeds them with an [`EmbeddingModel`] and persists the result. Bring your own store or
//! model by implementing these traits.
use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Embeddings;
use crate::document::Document;
use crate::metadata::Metadata;

/// All traits are easily mockable under tests
#[cfg(feature = "test-utils")]
#[doc(hidden)]
use mockall::automock;

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// Embeds a list of strings and returns its embeddings.
/// Assumes the strings will be moved.
pub trait EmbeddingModel: Send + Sync + Debug {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings>;
}

/// Settings an index was built with. Appending with different settings would mix chunking
/// parameters or embedding spaces within one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// Creates or opens a persisted index
pub trait VectorStore: Send + Sync + Debug {
    /// Opens the existing index, using `embedder` for any documents added later.
    async fn open(&self, embedder: Arc<dyn EmbeddingModel>) -> Result<Box<dyn IndexHandle>>;

    /// Builds a new index from `chunks`, replacing whatever the store held before once persisted.
    async fn build_from(
        &self,
        chunks: Vec<Document>,
        embedder: Arc<dyn EmbeddingModel>,
        settings: IndexSettings,
    ) -> Result<Box<dyn IndexHandle>>;
}

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// An opened index. Append only: entries are never deleted or re-embedded.
pub trait IndexHandle: Send + Sync + Debug {
    /// Settings recorded when the index was created, if the store keeps them.
    fn settings(&self) -> Option<IndexSettings>;

    /// Metadata of every entry in the index
    async fn get_all_metadata(&self) -> Result<Vec<Metadata>>;

    /// Embeds and adds chunks, returning how many were added
    async fn add_documents(&mut self, chunks: Vec<Document>) -> Result<usize>;

    /// Writes the index to durable storage
    async fn persist(&mut self) -> Result<()>;
}
