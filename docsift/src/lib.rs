//! # Docsift
//!
//! Docsift turns a directory of PDF and text files into a persistent embedding index. Files are
//! loaded in parallel, split into overlapping chunks, embedded and committed to a vector store on
//! disk. Running it again only adds the files that are not yet in the index.
//!
//! ## Features
//!
//! - Parallel loading on a blocking pool, one document per PDF page
//! - Recursive character splitting with a fixed overlap, or semantic splitting via `text-splitter`
//! - Append mode that skips sources already present in the index
//! - Abort or skip-and-report on files that fail to load
//! - A local, dependency free vector store and a hashed embedding model for offline use
//! - `FastEmbed` sentence-transformer embeddings behind a feature flag
//! - `tracing` throughout; the `docsift` binary installs a subscriber driven by `RUST_LOG`
//!
//! ## Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use docsift::{indexing::{IngestConfig, Ingestion}, integrations::{LocalStore, embedding_model_for}};
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = IngestConfig::builder()
//!     .source_directory("my_pdfs")
//!     .persist_directory("vector_db")
//!     .embeddings_model_name("hashed-384")
//!     .build()?;
//!
//! let store = Arc::new(LocalStore::new(&config.persist_directory));
//! let embedder = embedding_model_for(&config.embeddings_model_name)?;
//!
//! let report = Ingestion::builder()
//!     .config(config)
//!     .store(store)
//!     .embedder(embedder)
//!     .build()?
//!     .run()
//!     .await?;
//!
//! println!("{}: added {} chunks", report.mode, report.chunks_added);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
#![doc = document_features::document_features!()]

#[doc(inline)]
pub use docsift_core::type_aliases::*;
#[doc(inline)]
pub use docsift_core::{IndexingError, IndexingResult};

/// Common traits for stores and embedding models
pub mod traits {
    #[doc(inline)]
    pub use docsift_core::indexing_traits::*;
}

/// Vector stores and embedding models.
pub mod integrations {
    #[doc(inline)]
    pub use docsift_integrations::*;
}

/// The ingestion pipeline and its stages.
///
/// [`indexing::Ingestion`] runs a complete pass over a source directory. The scanner,
/// coordinator, chunker and index inspector are exposed for use on their own.
pub mod indexing {
    #[doc(inline)]
    pub use docsift_core::indexing::*;
    #[doc(inline)]
    pub use docsift_indexing::*;
}
