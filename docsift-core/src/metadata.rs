//! Metadata is a key-value store attached to every document
//!
//! Loaders record where a document came from under [`SOURCE_KEY`] and may add format specific
//! fields such as a page number. Chunks inherit their parent's metadata unchanged.
//!
//! Internally it uses a `BTreeMap` to store the key-value pairs, to ensure the data is sorted.
use std::collections::BTreeMap;

use serde::Deserializer;

/// Key under which loaders store the path a document was loaded from.
pub const SOURCE_KEY: &str = "source";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    inner: BTreeMap<String, serde_json::Value>,
}

impl Metadata {
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.inner.iter()
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&serde_json::Value> {
        self.inner.get(key.as_ref())
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    /// The `source` value, if present and a string.
    pub fn source(&self) -> Option<&str> {
        self.get(SOURCE_KEY).and_then(serde_json::Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K, V> Extend<(K, V)> for Metadata
where
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.inner
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl<K, V> From<Vec<(K, V)>> for Metadata
where
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    fn from(items: Vec<(K, V)>) -> Self {
        let inner = items
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Metadata { inner }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Metadata
where
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    fn from(arr: [(K, V); N]) -> Self {
        let inner = arr.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Metadata { inner }
    }
}

impl IntoIterator for Metadata {
    type Item = (String, serde_json::Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, serde_json::Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'iter> IntoIterator for &'iter Metadata {
    type Item = (&'iter String, &'iter serde_json::Value);
    type IntoIter = std::collections::btree_map::Iter<'iter, String, serde_json::Value>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

// Serialize as the inner map so stores see plain JSON objects
impl<'de> serde::Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::deserialize(deserializer).map(|inner| Metadata { inner })
    }
}

impl serde::Serialize for Metadata {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source() {
        let metadata = Metadata::from([(SOURCE_KEY, json!("my_pdfs/a.pdf")), ("page", json!(2))]);
        assert_eq!(metadata.source(), Some("my_pdfs/a.pdf"));

        let metadata = Metadata::from([(SOURCE_KEY, json!(42))]);
        assert_eq!(metadata.source(), None);

        assert_eq!(Metadata::default().source(), None);
    }

    #[test]
    fn test_iter_is_sorted_by_key() {
        let mut metadata = Metadata::default();
        metadata.insert("total_pages", json!(3));
        metadata.insert("page", json!(0));

        let keys: Vec<_> = metadata.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["page", "total_pages"]);
    }

    #[test]
    fn test_serde_is_a_plain_object() {
        let metadata = Metadata::from(vec![(SOURCE_KEY, "a.txt")]);
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value, json!({ "source": "a.txt" }));

        let back: Metadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, metadata);
    }
}
