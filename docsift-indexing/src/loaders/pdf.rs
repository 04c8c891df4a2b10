//! PDF loading strategy
//!
//! Extracts the text of every page with `lopdf` and emits one document per page, in page order.
//! Page numbers in metadata are 0-based, `total_pages` counts every page in the file whether or
//! not it produced a document.
use std::path::Path;

use anyhow::{Context as _, Result};
use docsift_core::indexing::Document;
use lopdf::Object;
use tracing::{debug, instrument};

/// Info dictionary keys copied into metadata when present.
const INFO_FIELDS: [(&str, &str); 6] = [
    ("Title", "title"),
    ("Author", "author"),
    ("Subject", "subject"),
    ("Keywords", "keywords"),
    ("Creator", "creator"),
    ("Producer", "producer"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfOptions {
    /// Do not emit documents for pages without any extractable text.
    pub skip_empty_pages: bool,
    /// Join hard-wrapped lines into single-line paragraphs.
    pub join_wrapped_lines: bool,
}

/// Loads every page of the PDF at `path`.
///
/// # Errors
///
/// Errors if the PDF cannot be read, is encrypted or malformed, has no pages, or text extraction
/// fails for any page.
#[instrument(skip(options), fields(path = %path.display()))]
pub(crate) fn load(path: &Path, options: &PdfOptions) -> Result<Vec<Document>> {
    let doc = match lopdf::Document::load(path) {
        Ok(doc) => doc,
        Err(e) if e.to_string().to_lowercase().contains("encrypted") => {
            anyhow::bail!("PDF is encrypted and cannot be processed");
        }
        Err(e) => return Err(e).context("Failed to parse PDF"),
    };

    if doc.is_encrypted() {
        anyhow::bail!("PDF is encrypted and cannot be processed");
    }

    let pages = doc.get_pages();
    let total_pages = pages.len();
    if total_pages == 0 {
        anyhow::bail!("PDF contains no pages");
    }

    let source = path.to_string_lossy().into_owned();
    let info = document_info(&doc);

    let mut documents = Vec::with_capacity(total_pages);
    for (index, page_number) in pages.keys().enumerate() {
        let text = doc
            .extract_text(&[*page_number])
            .with_context(|| format!("Failed to extract text from page {page_number}"))?;

        let text = if options.join_wrapped_lines {
            join_wrapped_lines(&text)
        } else {
            text
        };

        if options.skip_empty_pages && text.trim().is_empty() {
            debug!(page = index, "Skipping page without text");
            continue;
        }

        debug!(
            page = index,
            text_length = text.len(),
            "Extracted text from PDF page"
        );

        let mut builder = Document::builder();
        builder
            .original_size(text.len())
            .content(text)
            .source(source.clone())
            .with_metadata_value("file_path", source.clone())
            .with_metadata_value("page", index)
            .with_metadata_value("total_pages", total_pages);

        for (key, value) in &info {
            builder.with_metadata_value(*key, value.clone());
        }

        documents.push(builder.build()?);
    }

    Ok(documents)
}

fn document_info(doc: &lopdf::Document) -> Vec<(&'static str, String)> {
    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };
    let Some(info) = info else {
        return Vec::new();
    };

    INFO_FIELDS
        .iter()
        .filter_map(|(key, name)| match info.get(key.as_bytes()) {
            Ok(Object::String(bytes, _)) => Some((*name, decode_text_string(bytes))),
            _ => None,
        })
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
}

/// Decodes a PDF text string: UTF-16BE when it carries a byte order mark, Latin-1 otherwise.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect::<Vec<_>>();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().copied().map(char::from).collect()
    }
}

/// Reflows text so that lines of one paragraph are joined by a space and paragraphs are separated
/// by a blank line.
fn join_wrapped_lines(text: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(trimmed);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs.join("\n\n")
}
