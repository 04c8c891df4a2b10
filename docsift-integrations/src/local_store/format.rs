//! File formats of a persisted local index
use anyhow::{Context as _, Result, bail, ensure};
use docsift_core::{IndexSettings, indexing::Metadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub(crate) const FORMAT_VERSION: u32 = 1;
pub(crate) const HEADER_FILE: &str = "header.bin";
pub(crate) const IDS_FILE: &str = "ids.bin";
pub(crate) const VECTORS_FILE: &str = "vectors.bin";

const MAGIC: &[u8; 4] = b"DSFT";
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Contents of `collection.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct CollectionManifest {
    pub format_version: u32,
    pub name: String,
    pub settings: Option<IndexSettings>,
    pub dimensions: usize,
    pub count: usize,
}

/// One element of `entries.json`, in the same order as the vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredEntry {
    pub id: Uuid,
    pub document: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub original_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub dimensions: usize,
    pub count: usize,
}

impl Header {
    pub fn encode(self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(HEADER_LEN);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(
            &u32::try_from(self.dimensions)
                .context("Too many dimensions")?
                .to_le_bytes(),
        );
        bytes.extend_from_slice(&(self.count as u64).to_le_bytes());
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        ensure!(bytes.len() == HEADER_LEN, "Index header has the wrong length");
        ensure!(&bytes[..4] == MAGIC, "Index header has an unknown format");

        let version = u32::from_le_bytes(bytes[4..8].try_into()?);
        if version != FORMAT_VERSION {
            bail!("Unsupported index format version {version}");
        }

        let dimensions = u32::from_le_bytes(bytes[8..12].try_into()?);
        let count = u64::from_le_bytes(bytes[12..20].try_into()?);

        Ok(Self {
            dimensions: usize::try_from(dimensions)?,
            count: usize::try_from(count)?,
        })
    }
}

pub(crate) fn encode_ids(ids: &[Uuid]) -> Vec<u8> {
    ids.iter().flat_map(|id| id.as_bytes().iter().copied()).collect()
}

pub(crate) fn decode_ids(bytes: &[u8]) -> Result<Vec<Uuid>> {
    ensure!(bytes.len() % 16 == 0, "Index ids file is truncated");
    bytes
        .chunks_exact(16)
        .map(|chunk| Ok(Uuid::from_slice(chunk)?))
        .collect()
}

pub(crate) fn encode_vectors(vectors: &[Vec<f32>]) -> Vec<u8> {
    vectors
        .iter()
        .flatten()
        .flat_map(|value| value.to_le_bytes())
        .collect()
}

pub(crate) fn decode_vectors(bytes: &[u8], dimensions: usize) -> Result<Vec<Vec<f32>>> {
    if dimensions == 0 {
        ensure!(bytes.is_empty(), "Index vectors present without dimensions");
        return Ok(Vec::new());
    }

    let row_len = dimensions * 4;
    ensure!(bytes.len() % row_len == 0, "Index vectors file is truncated");

    Ok(bytes
        .chunks_exact(row_len)
        .map(|row| {
            row.chunks_exact(4)
                .map(|value| f32::from_le_bytes([value[0], value[1], value[2], value[3]]))
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header() {
        let header = Header {
            dimensions: 384,
            count: 12,
        };
        let bytes = header.encode().unwrap();

        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(Header::decode(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_rejects_foreign_files() {
        assert!(Header::decode(b"not a header at all!").is_err());
        assert!(Header::decode(b"DSFT").is_err());
    }

    #[test]
    fn test_vectors_layout() {
        let vectors = vec![vec![1.0, -2.5], vec![0.0, 3.25]];
        let bytes = encode_vectors(&vectors);

        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
        assert_eq!(decode_vectors(&bytes, 2).unwrap(), vectors);
        assert!(decode_vectors(&bytes[..10], 2).is_err());
    }

    #[test]
    fn test_ids() {
        let ids = vec![Uuid::new_v3(&Uuid::NAMESPACE_OID, b"a"), Uuid::nil()];
        assert_eq!(decode_ids(&encode_ids(&ids)).unwrap(), ids);
        assert!(decode_ids(&[0; 15]).is_err());
    }
}
