//! Plain text and markdown loading strategy. One document per file.
use std::path::Path;

use anyhow::{Context as _, Result};
use docsift_core::indexing::Document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOptions {
    /// Replace invalid UTF-8 sequences instead of failing the file.
    pub lossy_utf8: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self { lossy_utf8: true }
    }
}

pub(crate) fn load(path: &Path, options: &TextOptions) -> Result<Vec<Document>> {
    let bytes = fs_err::read(path)?;

    let content = if options.lossy_utf8 {
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        String::from_utf8(bytes).context("File is not valid UTF-8")?
    };

    let document = Document::builder()
        .original_size(content.len())
        .content(content)
        .source(path.to_string_lossy())
        .build()?;

    Ok(vec![document])
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    #[test]
    fn test_loads_whole_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.md");
        std::fs::write(&path, "# Notes\n\nSome text").unwrap();

        let documents = load(&path, &TextOptions::default()).unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, "# Notes\n\nSome text");
        assert_eq!(documents[0].original_size, 18);
        assert_eq!(documents[0].source(), Some(path.to_string_lossy().as_ref()));
    }

    #[test]
    fn test_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("latin1.txt");
        std::fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        let documents = load(&path, &TextOptions::default()).unwrap();
        assert_eq!(documents[0].content, "caf\u{FFFD}");

        let strict = TextOptions { lossy_utf8: false };
        assert!(load(&path, &strict).is_err());
    }

    #[test]
    fn test_unreadable_file() {
        let err = load(Path::new("missing/notes.txt"), &TextOptions::default()).unwrap_err();
        assert!(err.to_string().contains("missing/notes.txt"));
    }
}
