//! Select an embedding model by name
use std::sync::Arc;

use docsift_core::{EmbeddingModel, IndexingError, IndexingResult};

use crate::HashedEmbedding;

/// Builds the embedding model identified by `name`.
///
/// `hashed` and `hashed-<dimensions>` select [`HashedEmbedding`]. Any other name is looked up in
/// the `FastEmbed` model list, which requires the `fastembed` feature.
///
/// # Errors
///
/// Returns [`IndexingError::Config`] if the name is unknown or the model cannot be initialised.
pub fn embedding_model_for(name: &str) -> IndexingResult<Arc<dyn EmbeddingModel>> {
    if let Some(hashed) = HashedEmbedding::from_model_name(name) {
        tracing::debug!(dimensions = hashed.dimensions(), "Using hashed embeddings");
        return Ok(Arc::new(hashed));
    }

    external_model(name)
}

#[cfg(feature = "fastembed")]
fn external_model(name: &str) -> IndexingResult<Arc<dyn EmbeddingModel>> {
    let model = crate::fastembed::FastEmbed::from_model_name(name)
        .map_err(|err| IndexingError::config(format!("{err:#}")))?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "fastembed"))]
fn external_model(name: &str) -> IndexingResult<Arc<dyn EmbeddingModel>> {
    Err(IndexingError::config(format!(
        "embedding model {name:?} requires the `fastembed` feature; use `hashed` or \
         `hashed-<dimensions>` for offline embeddings"
    )))
}
