//! `FastEmbed` integration for text embedding.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use derive_builder::Builder;
use fastembed::{TextEmbedding, TextInitOptions};

use docsift_core::{EmbeddingModel, Embeddings};

/// A wrapper around the `FastEmbed` library for text embedding.
///
/// Supports a variety of fast local text embedding models. The default is `all-MiniLM-L6-v2` with
/// a dimension size of 384. Models are downloaded on first use.
///
/// See the [FastEmbed documentation](https://docs.rs/fastembed) for more information on usage.
///
/// Requires the `fastembed` feature to be enabled.
#[derive(Builder)]
#[builder(
    pattern = "owned",
    setter(strip_option),
    build_fn(error = "anyhow::Error")
)]
pub struct FastEmbed {
    #[builder(
        default = "TextEmbedding::try_new(TextInitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2))?"
    )]
    embedding_model: TextEmbedding,
    #[builder(default)]
    batch_size: Option<usize>,
}

impl std::fmt::Debug for FastEmbed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbed")
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl FastEmbed {
    /// Tries to build a default `FastEmbed` with `all-MiniLM-L6-v2`.
    ///
    /// # Errors
    ///
    /// Errors if the model cannot be downloaded or initialised
    pub fn try_default() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> FastEmbedBuilder {
        FastEmbedBuilder::default()
    }

    /// Builds the model named `name`, e.g. `all-MiniLM-L6-v2` or `BAAI/bge-small-en-v1.5`.
    ///
    /// # Errors
    ///
    /// Errors if the name is not a supported model or the model cannot be initialised
    pub fn from_model_name(name: &str) -> Result<Self> {
        let model = resolve_model(name).with_context(|| {
            format!("{name:?} is not a supported FastEmbed model")
        })?;

        let embedding_model = TextEmbedding::try_new(TextInitOptions::new(model))
            .with_context(|| format!("Failed to initialise FastEmbed model {name:?}"))?;

        Self::builder().embedding_model(embedding_model).build()
    }
}

/// Finds a supported model by its full model code, or by its name without the organisation
/// prefix and `-onnx` suffix. Matching is case-insensitive.
pub fn resolve_model(name: &str) -> Option<fastembed::EmbeddingModel> {
    let wanted = short_name(name);
    let supported = TextEmbedding::list_supported_models();

    supported
        .iter()
        .find(|info| info.model_code.eq_ignore_ascii_case(name))
        .or_else(|| {
            supported
                .iter()
                .find(|info| short_name(&info.model_code) == wanted)
        })
        .map(|info| info.model.clone())
}

fn short_name(code: &str) -> String {
    let last = code.rsplit('/').next().unwrap_or(code);
    last.trim_end_matches("-onnx").to_ascii_lowercase()
}

#[async_trait]
impl EmbeddingModel for FastEmbed {
    #[tracing::instrument(skip_all)]
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings> {
        self.embedding_model.embed(input, self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model() {
        assert_eq!(
            resolve_model("Qdrant/all-MiniLM-L6-v2-onnx"),
            Some(fastembed::EmbeddingModel::AllMiniLML6V2)
        );
        assert!(resolve_model("all-MiniLM-L6-v2").is_some());
        assert!(resolve_model("sentence-transformers/all-MiniLM-L6-v2").is_some());
        assert!(resolve_model("BAAI/bge-small-en-v1.5").is_some());
        assert_eq!(resolve_model("not-a-model"), None);
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("Qdrant/all-MiniLM-L6-v2-onnx"), "all-minilm-l6-v2");
        assert_eq!(short_name("bge-small-en-v1.5"), "bge-small-en-v1.5");
    }

    #[ignore = "downloads the model"]
    #[tokio::test]
    async fn test_fastembed() {
        let fastembed = FastEmbed::try_default().unwrap();
        let embeddings = fastembed.embed(vec!["hello".to_string()]).await.unwrap();
        assert_eq!(embeddings.len(), 1);
    }
}
