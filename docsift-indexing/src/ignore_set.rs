//! Sources that are already represented in the persisted index
use std::collections::HashSet;

use docsift_core::indexing::Metadata;

/// Set of `source` paths to exclude from a scan.
///
/// Computed fresh for every run from a snapshot of the index metadata and never persisted. Paths
/// are compared as exact strings, in whatever representation the loaders recorded them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    sources: HashSet<String>,
}

impl IgnoreSet {
    /// Collects every `source` value found in `metadata`. Entries without a string `source` are
    /// skipped.
    pub fn from_metadata<'a>(metadata: impl IntoIterator<Item = &'a Metadata>) -> Self {
        metadata
            .into_iter()
            .filter_map(Metadata::source)
            .map(str::to_string)
            .collect()
    }

    pub fn contains(&self, source: &str) -> bool {
        self.sources.contains(source)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            sources: iter.into_iter().map(Into::into).collect(),
        }
    }
}
