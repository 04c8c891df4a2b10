//! Offline embeddings by feature hashing.
use std::hash::{DefaultHasher, Hash, Hasher};

use anyhow::Result;
use async_trait::async_trait;
use docsift_core::{Embedding, EmbeddingModel, Embeddings};

pub const DEFAULT_DIMENSIONS: usize = 384;
const MODEL_PREFIX: &str = "hashed";

/// A deterministic bag-of-tokens embedding.
///
/// Every lowercase ASCII alphanumeric token is hashed into one of `dimensions` buckets, and the
/// bucket counts are L2 normalised. There is no model to download, which makes it useful for
/// offline runs and tests. Similar texts share tokens and so land close together, but there is no
/// semantic understanding beyond that.
///
/// Selected with the model names `hashed` (384 dimensions) or `hashed-<dimensions>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashedEmbedding {
    dimensions: usize,
}

impl Default for HashedEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashedEmbedding {
    /// Creates the model. Zero dimensions are raised to one.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Parses `hashed` or `hashed-<dimensions>`. Returns `None` for any other name.
    pub fn from_model_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        let rest = name.strip_prefix(MODEL_PREFIX)?;

        if rest.is_empty() {
            return Some(Self::default());
        }

        rest.strip_prefix('-')?
            .parse::<usize>()
            .ok()
            .filter(|dimensions| *dimensions > 0)
            .map(Self::new)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embed_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokens(text) {
            vector[bucket(&token, self.dimensions)] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

#[async_trait]
impl EmbeddingModel for HashedEmbedding {
    #[tracing::instrument(skip_all, fields(inputs = input.len()))]
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings> {
        Ok(input.iter().map(|text| self.embed_text(text)).collect())
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
}

#[allow(clippy::cast_possible_truncation)]
fn bucket(token: &str, dimensions: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % dimensions
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("hashed", Some(384))]
    #[test_case("HASHED-64", Some(64))]
    #[test_case("hashed-0", None)]
    #[test_case("hashed-abc", None)]
    #[test_case("hashedx", None)]
    #[test_case("all-MiniLM-L6-v2", None)]
    fn test_from_model_name(name: &str, dimensions: Option<usize>) {
        assert_eq!(
            HashedEmbedding::from_model_name(name).map(|model| model.dimensions()),
            dimensions
        );
    }

    #[test]
    fn test_vectors_are_normalised_and_deterministic() {
        let model = HashedEmbedding::new(32);
        let a = model.embed_text("The quick brown fox");
        let b = model.embed_text("the QUICK brown fox!");

        assert_eq!(a.len(), 32);
        assert_eq!(a, b);

        let norm = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let vector = HashedEmbedding::new(8).embed_text(" ... ");
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let embeddings = HashedEmbedding::default()
            .embed(vec!["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.iter().all(|e| e.len() == DEFAULT_DIMENSIONS));
    }
}
