//! The ingestion pipeline: load a source directory, chunk it and commit it to a vector store.
//!
//! Start with [`Ingestion`]. The individual stages ([`CorpusScanner`], [`IngestionCoordinator`],
//! [`transformers::ChunkText`], [`IndexStateInspector`]) can also be used on their own.
pub mod config;
pub mod coordinator;
mod ignore_set;
pub mod index_state;
pub mod ingestion;
pub mod loaders;
pub mod persist;
pub mod progress;
pub mod scanner;
pub mod transformers;

pub use config::{FailurePolicy, IngestConfig, SplitMode};
pub use coordinator::{IngestionCoordinator, LoadFailure, LoadOutcome};
pub use ignore_set::IgnoreSet;
pub use index_state::IndexStateInspector;
pub use ingestion::{IngestMode, Ingestion, IngestionReport};
pub use progress::{ProgressReporter, TracingProgress};
pub use scanner::CorpusScanner;
