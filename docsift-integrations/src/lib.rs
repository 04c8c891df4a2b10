//! Integrations with external libraries and storage.
//!
//! Each integration is behind a feature flag, except for the hashed embedding model which has no
//! dependencies of its own.
mod embeddings;
pub mod hashed;

#[cfg(feature = "fastembed")]
pub mod fastembed;
#[cfg(feature = "local-store")]
pub mod local_store;

pub use embeddings::embedding_model_for;
pub use hashed::HashedEmbedding;

#[cfg(feature = "local-store")]
pub use local_store::LocalStore;
