//! Core types and traits shared by the docsift crates.
//!
//! The ingestion pipeline lives in `docsift-indexing`; concrete stores and embedding models live
//! in `docsift-integrations`. Both only talk to each other through what is defined here.
mod document;
mod errors;
mod index_layout;
pub mod indexing_traits;
mod metadata;
pub mod type_aliases;

pub use type_aliases::*;

/// All traits are available from the root
pub use crate::indexing_traits::*;

pub use crate::errors::{IndexingError, IndexingResult};

pub mod indexing {
    pub use crate::document::*;
    pub use crate::index_layout::*;
    pub use crate::indexing_traits::*;
    pub use crate::metadata::*;
}

pub mod util;
