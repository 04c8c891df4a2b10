//! Maps file extensions to the strategy that loads them
//!
//! Strategies are a closed set: a file type is supported only if an entry for its extension
//! exists, and anything else fails closed with [`IndexingError::UnsupportedFormat`]. Adding a file
//! type is a matter of adding an entry, callers never change.
use std::{collections::BTreeMap, path::Path};

use docsift_core::{IndexingError, IndexingResult, indexing::Document};
use lazy_static::lazy_static;

use super::{pdf::PdfOptions, text::TextOptions};

lazy_static! {
    static ref GLOBAL_REGISTRY: LoaderRegistry = LoaderRegistry::default();
}

/// A format specific parser together with its configuration.
#[derive(Debug, Clone, PartialEq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LoaderStrategy {
    /// One document per page, extracted with `lopdf`
    Pdf(PdfOptions),
    /// One document per file, read as UTF-8
    Text(TextOptions),
}

impl LoaderStrategy {
    /// Parses the file at `path` into its documents, in file order.
    ///
    /// # Errors
    ///
    /// Errors if the file cannot be read or parsed. The error carries the cause only; callers
    /// attribute it to the path.
    pub fn load(&self, path: &Path) -> anyhow::Result<Vec<Document>> {
        match self {
            LoaderStrategy::Pdf(options) => super::pdf::load(path, options),
            LoaderStrategy::Text(options) => super::text::load(path, options),
        }
    }
}

/// Registry of supported extensions.
///
/// The default registry supports `pdf`, `txt` and `md`. Extensions are matched without the leading
/// dot and ASCII case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderRegistry {
    entries: BTreeMap<String, LoaderStrategy>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::empty()
            .with_entry("pdf", LoaderStrategy::Pdf(PdfOptions::default()))
            .with_entry("txt", LoaderStrategy::Text(TextOptions::default()))
            .with_entry("md", LoaderStrategy::Text(TextOptions::default()))
    }
}

impl LoaderRegistry {
    /// A registry without any entries. Nothing will be loaded until entries are added.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// A registry that only loads PDFs.
    pub fn pdf_only() -> Self {
        Self::empty().with_entry("pdf", LoaderStrategy::Pdf(PdfOptions::default()))
    }

    /// The process-wide default registry.
    pub fn global() -> &'static LoaderRegistry {
        &GLOBAL_REGISTRY
    }

    /// Adds or replaces the strategy for an extension.
    ///
    /// # Arguments
    /// * `extension` - The extension, with or without the leading dot.
    /// * `strategy` - The strategy used for files with that extension.
    #[must_use]
    pub fn with_entry(mut self, extension: impl AsRef<str>, strategy: LoaderStrategy) -> Self {
        self.entries
            .insert(normalize_extension(extension.as_ref()), strategy);
        self
    }

    /// Looks up the strategy for an extension.
    ///
    /// # Errors
    ///
    /// Returns [`IndexingError::UnsupportedFormat`] if the extension is not registered.
    pub fn resolve(&self, extension: &str) -> IndexingResult<&LoaderStrategy> {
        self.entries
            .get(&normalize_extension(extension))
            .ok_or_else(|| IndexingError::UnsupportedFormat {
                extension: extension.to_string(),
            })
    }

    /// Looks up the strategy for the extension of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexingError::UnsupportedFormat`] if the path has no extension or it is not
    /// registered.
    pub fn resolve_path(&self, path: &Path) -> IndexingResult<&LoaderStrategy> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy())
            .unwrap_or_default();

        self.resolve(&extension)
    }

    pub fn supports_path(&self, path: &Path) -> bool {
        self.resolve_path(path).is_ok()
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}
