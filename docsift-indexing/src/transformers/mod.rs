//! Transformations applied to loaded documents before they are stored
pub mod chunk_text;

pub use chunk_text::{ChunkText, split};
