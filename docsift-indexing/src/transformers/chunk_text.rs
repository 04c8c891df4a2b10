//! Chunk document content into overlapping pieces
use std::{ops::Range, sync::Arc};

use docsift_core::{
    IndexingError, IndexingResult,
    indexing::{Chunk, Document},
    util::char_boundaries,
};
use text_splitter::{Characters, ChunkConfig, TextSplitter};

use crate::config::{IngestConfig, SplitMode, check_chunk_parameters};

/// Separators tried in order, largest first. Within a level the rightmost match wins.
const SEPARATOR_LEVELS: [&[&str]; 2] = [&["\n\n"], &[". ", "! ", "? ", "\n"]];

/// Splits documents into chunks of at most `chunk_size` characters.
///
/// In [`SplitMode::Recursive`] a chunk ends at the last paragraph break in its window, failing
/// that at the last sentence break, then at the last whitespace, and otherwise is cut hard at
/// `chunk_size`. The next chunk starts `chunk_overlap` characters before the previous one ended,
/// so consecutive chunks share exactly `chunk_overlap` characters.
///
/// In [`SplitMode::Semantic`] the splitting is delegated to [`text_splitter`], which bounds the
/// overlap rather than matching it exactly.
///
/// Chunks inherit the metadata of their document unchanged. Whitespace-only documents produce no
/// chunks. Recursive mode drops whitespace-only pieces only at the start and end of a document,
/// semantic mode drops them everywhere. Splitting is deterministic.
#[derive(Debug, Clone)]
pub struct ChunkText {
    chunk_size: usize,
    chunk_overlap: usize,
    splitter: Splitter,
}

#[derive(Debug, Clone)]
enum Splitter {
    Recursive,
    Semantic(Arc<TextSplitter<Characters>>),
}

impl ChunkText {
    /// Creates a recursive chunker.
    ///
    /// # Errors
    ///
    /// Returns [`IndexingError::Config`] if `chunk_size` is zero or `chunk_overlap` is not smaller
    /// than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> IndexingResult<Self> {
        Self::with_mode(chunk_size, chunk_overlap, SplitMode::Recursive)
    }

    /// Creates a chunker using the given split mode.
    ///
    /// # Errors
    ///
    /// See [`ChunkText::new`].
    pub fn with_mode(
        chunk_size: usize,
        chunk_overlap: usize,
        mode: SplitMode,
    ) -> IndexingResult<Self> {
        check_chunk_parameters(chunk_size, chunk_overlap)?;

        let splitter = match mode {
            SplitMode::Recursive => Splitter::Recursive,
            SplitMode::Semantic => {
                let config = ChunkConfig::new(chunk_size)
                    .with_overlap(chunk_overlap)
                    .map_err(|err| IndexingError::config(err.to_string()))?;
                Splitter::Semantic(Arc::new(TextSplitter::new(config)))
            }
        };

        Ok(Self {
            chunk_size,
            chunk_overlap,
            splitter,
        })
    }

    /// Creates the chunker described by an ingestion config.
    ///
    /// # Errors
    ///
    /// See [`ChunkText::new`].
    pub fn from_config(config: &IngestConfig) -> IndexingResult<Self> {
        Self::with_mode(config.chunk_size, config.chunk_overlap, config.split_mode)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits every document, keeping document order and the order of chunks within each.
    #[tracing::instrument(name = "indexing.split", skip_all, fields(documents = documents.len()))]
    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|document| self.split_document(document))
            .collect()
    }

    /// Splits a single document.
    pub fn split_document(&self, document: &Document) -> Vec<Chunk> {
        if document.is_blank() {
            return Vec::new();
        }

        let text = document.content.as_str();
        let pieces: Vec<(usize, &str)> = match &self.splitter {
            Splitter::Recursive => {
                let pieces = recursive_ranges(text, self.chunk_size, self.chunk_overlap)
                    .into_iter()
                    .map(|range| (range.start, &text[range]))
                    .collect::<Vec<_>>();
                // Blank pieces inside the document carry the overlap between their neighbours
                trim_blank_pieces(pieces)
            }
            Splitter::Semantic(splitter) => splitter
                .chunk_indices(text)
                .filter(|piece| !is_blank_piece(piece))
                .collect(),
        };

        pieces
            .into_iter()
            .map(|(offset, piece)| Chunk {
                content: piece.to_string(),
                metadata: document.metadata.clone(),
                original_size: document.original_size,
                offset,
            })
            .collect()
    }
}

/// Splits `documents` with the recursive strategy.
///
/// # Errors
///
/// Returns [`IndexingError::Config`] if `chunk_overlap` is not smaller than `chunk_size`.
pub fn split(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> IndexingResult<Vec<Chunk>> {
    Ok(ChunkText::new(chunk_size, chunk_overlap)?.split(documents))
}

fn is_blank_piece(piece: &(usize, &str)) -> bool {
    piece.1.trim().is_empty()
}

/// Drops whitespace-only pieces at the start and end of a document.
fn trim_blank_pieces(pieces: Vec<(usize, &str)>) -> Vec<(usize, &str)> {
    let Some(first) = pieces.iter().position(|piece| !is_blank_piece(piece)) else {
        return Vec::new();
    };
    let last = pieces
        .iter()
        .rposition(|piece| !is_blank_piece(piece))
        .unwrap_or(first);

    pieces.into_iter().skip(first).take(last - first + 1).collect()
}

/// Byte ranges of the recursive chunks of `text`.
///
/// Works on character positions so multi-byte text is never cut inside a character.
fn recursive_ranges(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<Range<usize>> {
    let bounds = char_boundaries(text);
    let total = bounds.len() - 1;

    let mut ranges = Vec::new();
    let mut start: usize = 0;
    loop {
        let end = start.saturating_add(chunk_size).min(total);
        if end == total {
            ranges.push(bounds[start]..bounds[total]);
            break;
        }

        let window = &text[bounds[start]..bounds[end]];
        // A split at or before the overlap would not move the next window forward
        let split = find_split(window, chunk_overlap + 1).unwrap_or(end - start);

        ranges.push(bounds[start]..bounds[start + split]);
        start += split - chunk_overlap;
    }

    ranges
}

/// Character count of the longest prefix of `window` that ends right after a separator and is at
/// least `min_chars` long.
fn find_split(window: &str, min_chars: usize) -> Option<usize> {
    for level in SEPARATOR_LEVELS {
        let best = level
            .iter()
            .filter_map(|separator| {
                window
                    .rfind(separator)
                    .map(|idx| window[..idx + separator.len()].chars().count())
            })
            .filter(|&split| split >= min_chars)
            .max();

        if best.is_some() {
            return best;
        }
    }

    window
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map(|(idx, ch)| window[..idx + ch.len_utf8()].chars().count())
        .filter(|&split| split >= min_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::indexing::SOURCE_KEY;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod \
        tempor incididunt ut labore et dolore magna aliqua.\n\nUt enim ad minim veniam, quis \
        nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat! Duis aute \
        irure dolor in reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla \
        pariatur.\nExcepteur sint occaecat cupidatat non proident, sunt in culpa qui officia \
        deserunt mollit anim id est laborum.\n\nJürgen ate 🦀 and 🍕 in Zürich? Yes.";

    fn document(content: &str) -> Document {
        Document::new(content).with_metadata([(SOURCE_KEY, json!("my_pdfs/a.pdf")), ("page", json!(3))])
    }

    fn prefix(s: &str, chars: usize) -> String {
        s.chars().take(chars).collect()
    }

    fn suffix(s: &str, chars: usize) -> String {
        let count = s.chars().count();
        s.chars().skip(count.saturating_sub(chars)).collect()
    }

    #[test_case(500, 50 ; "defaults")]
    #[test_case(100, 20 ; "small")]
    #[test_case(40, 10 ; "tiny")]
    #[test_case(13, 12 ; "overlap close to size")]
    #[test_case(10, 0 ; "no overlap")]
    fn test_chunk_bounds_and_overlap(chunk_size: usize, chunk_overlap: usize) {
        let documents = vec![document(LOREM), document(&"x".repeat(333))];
        let chunks = split(&documents, chunk_size, chunk_overlap).unwrap();

        for parent in &documents {
            let own: Vec<_> = chunks
                .iter()
                .filter(|chunk| chunk.original_size == parent.original_size)
                .collect();
            assert!(!own.is_empty());

            for chunk in &own {
                assert!(chunk.content.chars().count() <= chunk_size);
                assert_eq!(
                    &parent.content[chunk.offset..chunk.offset + chunk.content.len()],
                    chunk.content
                );
            }

            for pair in own.windows(2) {
                assert_eq!(
                    suffix(&pair[0].content, chunk_overlap),
                    prefix(&pair[1].content, chunk_overlap)
                );
            }

            let last = own.last().unwrap();
            assert_eq!(last.offset + last.content.len(), parent.content.len());
        }
    }

    #[test_case("x.   \n\n    \n\n   y", 4, 1 ; "blank paragraphs")]
    #[test_case("  \n\nAlpha.\n\n\n\n\n\n\n\n\n\nBeta.          \n\n          Gamma", 8, 3 ; "leading blank and long runs")]
    #[test_case(&format!("start{}end", " ".repeat(64)), 10, 4 ; "space run")]
    #[test_case(&format!("a.{}b! c", "\n".repeat(40)), 6, 5 ; "newline run")]
    fn test_whitespace_runs_keep_exact_overlap(
        text: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) {
        let parent = document(text);
        let chunks = split(std::slice::from_ref(&parent), chunk_size, chunk_overlap).unwrap();
        assert!(chunks.len() > 1);

        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= chunk_size);
            assert_eq!(
                &parent.content[chunk.offset..chunk.offset + chunk.content.len()],
                chunk.content
            );
        }

        for pair in chunks.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            let previous_end = previous.offset + previous.content.len();
            let shared = &parent.content[next.offset..previous_end];

            assert_eq!(shared.chars().count(), chunk_overlap);
            assert_eq!(
                suffix(&previous.content, chunk_overlap),
                prefix(&next.content, chunk_overlap)
            );
        }

        assert!(!chunks.first().unwrap().content.trim().is_empty());
        assert!(!chunks.last().unwrap().content.trim().is_empty());
        let last = chunks.last().unwrap();
        assert_eq!(last.offset + last.content.len(), parent.content.len());
    }

    #[test]
    fn test_blank_paragraphs_between_sentences_are_kept() {
        let chunks = split(&[document("x.   \n\n    \n\n   y")], 4, 1).unwrap();

        assert!(chunks.iter().any(|chunk| chunk.content.trim().is_empty()));
        assert_eq!(chunks.first().unwrap().offset, 0);
        assert_eq!(chunks.last().unwrap().content, " y");
    }

    #[test]
    fn test_unbounded_chunk_size_does_not_overflow() {
        let chunks = split(&[document("Short text. Nothing else.")], usize::MAX, 0).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Short text. Nothing else.");
    }

    #[test]
    fn test_split_is_deterministic() {
        let documents = vec![document(LOREM), document("Second. Document.")];

        let first = split(&documents, 64, 16).unwrap();
        let second = split(&documents, 64, 16).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(Document::id).collect::<Vec<_>>(),
            second.iter().map(Document::id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a".repeat(30), "b ".repeat(30));
        let chunks = split(&[document(&text)], 50, 5).unwrap();

        assert_eq!(chunks[0].content, format!("{}\n\n", "a".repeat(30)));
    }

    #[test]
    fn test_prefers_sentences_over_words() {
        let text = "One two three. Four five six seven eight nine ten";
        let chunks = split(&[document(text)], 30, 0).unwrap();

        assert_eq!(chunks[0].content, "One two three. ");
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let text = "🦀".repeat(25);
        let chunks = split(&[document(&text)], 10, 2).unwrap();

        assert_eq!(chunks[0].content, "🦀".repeat(10));
        assert_eq!(chunks[1].offset, "🦀".repeat(8).len());
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_short_document_is_one_chunk() {
        let chunks = split(&[document("Short text.")], 500, 50).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Short text.");
        assert_eq!(chunks[0].offset, 0);
    }

    #[test]
    fn test_chunks_inherit_metadata() {
        let parent = document(LOREM);
        let chunks = split(std::slice::from_ref(&parent), 100, 10).unwrap();

        assert!(chunks.len() > 1);
        for chunk in chunks {
            assert_eq!(chunk.metadata, parent.metadata);
            assert_eq!(chunk.original_size, parent.original_size);
        }
    }

    #[test]
    fn test_blank_documents_produce_nothing() {
        let chunks = split(&[document(""), document(" \n\n\t ")], 100, 10).unwrap();
        assert!(chunks.is_empty());
    }

    #[test_case(50, 50 ; "equal")]
    #[test_case(50, 60 ; "larger")]
    #[test_case(0, 0 ; "zero size")]
    fn test_invalid_parameters(chunk_size: usize, chunk_overlap: usize) {
        let err = split(&[document(LOREM)], chunk_size, chunk_overlap).unwrap_err();
        assert!(matches!(err, IndexingError::Config(_)));
    }

    #[test]
    fn test_semantic_mode_respects_chunk_size() {
        let chunker = ChunkText::with_mode(80, 10, SplitMode::Semantic).unwrap();
        let parent = document(LOREM);
        let chunks = chunker.split(std::slice::from_ref(&parent));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 80);
            assert_eq!(
                &parent.content[chunk.offset..chunk.offset + chunk.content.len()],
                chunk.content
            );
            assert_eq!(chunk.metadata, parent.metadata);
        }
    }

    #[test]
    fn test_from_config() {
        let config = IngestConfig::builder()
            .chunk_size(120_usize)
            .chunk_overlap(12_usize)
            .build()
            .unwrap();
        let chunker = ChunkText::from_config(&config).unwrap();

        assert_eq!(chunker.chunk_size(), 120);
        assert_eq!(chunker.chunk_overlap(), 12);
    }
}
