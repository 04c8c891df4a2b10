//! This module defines the `Document` struct and its associated methods.
//!
//! A `Document` is a unit of loaded content: the text of a file, or of one page of a file, together
//! with metadata that always names the `source` it was loaded from.
//!
//! Chunks are Documents too. The chunker slices a parent's content and copies its metadata
//! unchanged, so every chunk can be traced back to the file it came from. The byte offset of the
//! slice and the size of the parent content are kept on the struct, not in the metadata.
use std::{
    fmt::Debug,
    hash::{Hash, Hasher},
};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    metadata::{Metadata, SOURCE_KEY},
    util::debug_long_utf8,
};

/// A chunk is a Document derived from another Document by the chunker.
pub type Chunk = Document;

/// Represents a unit of content flowing through the ingestion pipeline.
#[derive(Default, Clone, Serialize, Deserialize, PartialEq, Builder)]
#[builder(setter(into, strip_option), build_fn(error = "anyhow::Error"))]
pub struct Document {
    /// Text content of the document.
    pub content: String,
    /// Metadata associated with the document. Must contain a `source`.
    #[builder(default)]
    pub metadata: Metadata,
    /// Size in bytes of the content this document was originally derived from.
    #[builder(default)]
    pub original_size: usize,
    /// Offset in bytes of this content relative to the content it was derived from.
    #[builder(default)]
    pub offset: usize,
}

impl DocumentBuilder {
    /// Sets the `source` metadata value, keeping any other metadata already set.
    pub fn source(&mut self, source: impl Into<String>) -> &mut Self {
        self.metadata
            .get_or_insert_with(Metadata::default)
            .insert(SOURCE_KEY, source.into());
        self
    }

    pub fn with_metadata_value(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.metadata
            .get_or_insert_with(Metadata::default)
            .insert(key, value);
        self
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id())
            .field("content", &debug_long_utf8(&self.content, 100))
            .field("metadata", &self.metadata)
            .field("original_size", &self.original_size)
            .field("offset", &self.offset)
            .finish()
    }
}

impl Document {
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Creates a document from content alone. The other fields are set to their default values.
    pub fn new(content: impl Into<String>) -> Document {
        let content = content.into();
        let original_size = content.len();
        Document {
            content,
            original_size,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: impl Into<Metadata>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// The path this document was loaded from, if recorded.
    pub fn source(&self) -> Option<&str> {
        self.metadata.source()
    }

    /// True if the content holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Retrieve the identifier of the document.
    ///
    /// A UUID (v3) over the source, offset and content, so chunking the same input twice yields
    /// the same identifiers.
    ///
    /// WARN: Does not memoize the id. Use sparingly.
    pub fn id(&self) -> uuid::Uuid {
        let bytes = [
            self.source().unwrap_or_default().as_bytes(),
            &self.offset.to_le_bytes(),
            self.content.as_bytes(),
        ]
        .concat();

        uuid::Uuid::new_v3(&uuid::Uuid::NAMESPACE_OID, &bytes)
    }
}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source().hash(state);
        self.offset.hash(state);
        self.content.hash(state);
    }
}

impl<T: Into<String>> From<T> for Document {
    fn from(value: T) -> Self {
        Document::new(value)
    }
}
