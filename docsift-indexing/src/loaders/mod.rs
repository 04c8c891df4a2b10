//! Loading files into documents
//!
//! The [`LoaderRegistry`] maps extensions to a [`LoaderStrategy`], and the [`DocumentLoader`]
//! applies the registered strategy to a single path.
mod document_loader;
pub mod pdf;
mod registry;
pub mod text;

pub use document_loader::DocumentLoader;
pub use pdf::PdfOptions;
pub use registry::{LoaderRegistry, LoaderStrategy};
pub use text::TextOptions;
