//! Storage backends that live inside the indexing crate
mod memory_store;

pub use memory_store::MemoryStore;
