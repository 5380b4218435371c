//! Boundary-aware text chunking with fixed character overlap

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, Document, Metadata, MetadataValue, ScalarMetadata};

/// Split points, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
    Char,
}

impl Boundary {
    fn finer(self) -> Self {
        match self {
            Boundary::Paragraph => Boundary::Line,
            Boundary::Line => Boundary::Sentence,
            Boundary::Sentence => Boundary::Word,
            Boundary::Word | Boundary::Char => Boundary::Char,
        }
    }

    /// Split keeping each separator attached to the piece before it
    fn split(self, text: &str) -> Vec<&str> {
        match self {
            Boundary::Paragraph => text.split_inclusive("\n\n").collect(),
            Boundary::Line => text.split_inclusive('\n').collect(),
            Boundary::Sentence => text.split_sentence_bounds().collect(),
            Boundary::Word => text.split_word_bounds().collect(),
            Boundary::Char => vec![text],
        }
    }
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Maximum chunk size in characters, 0 disables splitting
    chunk_size: usize,
    /// Characters repeated at the head of the next chunk
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a new chunker, rejecting an overlap that fills the chunk
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
        }
        .validate()?;

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split every document, tagging chunks with their parent's metadata.
    ///
    /// With `chunk_size == 0` each document becomes exactly one chunk.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        if self.chunk_size == 0 {
            return documents
                .iter()
                .map(|doc| Chunk::new(doc.text.clone(), doc.metadata.clone()))
                .collect();
        }

        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .map(|text| Chunk::new(text, doc.metadata.clone()))
            })
            .collect()
    }

    /// Split text into chunks of at most `chunk_size` characters where each
    /// chunk starts with the last `chunk_overlap` characters of the previous one
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if self.chunk_size == 0 {
            return vec![text.to_string()];
        }
        if text.is_empty() {
            return Vec::new();
        }

        // Any atomic piece fits behind a full overlap
        let limit = self.chunk_size - self.chunk_overlap;
        let mut pieces = Vec::new();
        segment(text, Boundary::Paragraph, limit, &mut pieces);

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for (piece, piece_len) in pieces {
            if current_len > 0 && current_len + piece_len > self.chunk_size {
                let tail = tail_chars(&current, self.chunk_overlap).to_string();
                chunks.push(std::mem::replace(&mut current, tail));
                current_len = self.chunk_overlap.min(current_len);
            }
            current.push_str(piece);
            current_len += piece_len;
        }

        if current_len > 0 {
            chunks.push(current);
        }
        chunks
    }
}

/// Recursively break `text` into pieces of at most `limit` characters,
/// preferring coarse boundaries
fn segment<'a>(text: &'a str, boundary: Boundary, limit: usize, out: &mut Vec<(&'a str, usize)>) {
    let len = text.chars().count();
    if len <= limit {
        if len > 0 {
            out.push((text, len));
        }
        return;
    }

    if boundary == Boundary::Char {
        let mut start = 0;
        let mut count = 0;
        for (index, _) in text.char_indices() {
            if count == limit {
                out.push((&text[start..index], count));
                start = index;
                count = 0;
            }
            count += 1;
        }
        out.push((&text[start..], count));
        return;
    }

    for part in boundary.split(text) {
        segment(part, boundary.finer(), limit, out);
    }
}

/// The last `n` characters of `text`
fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}

/// Split documents with explicit parameters
pub fn split(documents: &[Document], chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Chunk>> {
    Ok(TextChunker::new(chunk_size, chunk_overlap)?.split_documents(documents))
}

/// Keep only scalar metadata values (string, integer, float, bool)
pub fn filter_complex_metadata(metadata: &Metadata) -> ScalarMetadata {
    metadata
        .iter()
        .filter_map(|(key, value)| MetadataValue::from_json(value).map(|v| (key.clone(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use proptest::prelude::*;
    use serde_json::json;

    fn chars(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_zero_size_passes_documents_through() {
        let docs = vec![
            Document::new("x".repeat(5000)).with_metadata("page", 1),
            Document::new("short"),
        ];
        let chunks = split(&docs, 0, 64).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, docs[0].text);
        assert_eq!(chunks[0].metadata["page"], 1);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(matches!(TextChunker::new(10, 10), Err(Error::Config(_))));
        assert!(TextChunker::new(0, 10).is_ok());
        assert!(TextChunker::new(11, 10).is_ok());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(2048, 64).unwrap();
        assert_eq!(chunker.split_text("Hello world."), vec!["Hello world."]);
        assert!(chunker.split_text("").is_empty());
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let chunker = TextChunker::new(30, 0).unwrap();
        let text = "First paragraph here.\n\nSecond paragraph here.";
        assert_eq!(
            chunker.split_text(text),
            vec!["First paragraph here.\n\n", "Second paragraph here."]
        );
    }

    #[test]
    fn test_overlap_is_exact() {
        let chunker = TextChunker::new(40, 8).unwrap();
        let text = "The pump must be primed before start. The valve stays closed until \
                    pressure settles. Operators log every reading in the shift book.";
        let chunks = chunker.split_text(text);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(chars(&pair[0]) - 8).collect();
            let head: String = pair[1].chars().take(8).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_hard_cut_on_unbroken_text() {
        let chunker = TextChunker::new(10, 2).unwrap();
        let chunks = chunker.split_text(&"é".repeat(25));
        let sizes: Vec<usize> = chunks.iter().map(|c| chars(c)).collect();
        assert_eq!(sizes, vec![8, 10, 10, 3]);
    }

    #[test]
    fn test_chunks_keep_parent_metadata() {
        let doc = Document::new("a ".repeat(100)).with_metadata("sheet_name", "Q1");
        let chunks = split(&[doc], 50, 5).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.metadata["sheet_name"] == "Q1"));
    }

    #[test]
    fn test_filter_complex_metadata() {
        let doc = Document::new("t")
            .with_metadata("page", 3)
            .with_metadata("title", "manual")
            .with_metadata("tags", json!(["a", "b"]))
            .with_metadata("extra", json!({"k": "v"}))
            .with_metadata("missing", json!(null));

        let filtered = filter_complex_metadata(&doc.metadata);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered["page"], MetadataValue::Int(3));
        assert_eq!(filtered["title"], MetadataValue::from("manual"));
    }

    proptest! {
        #[test]
        fn prop_chunks_respect_size_and_overlap(
            text in "[a-z .\n]{0,600}",
            size in 5usize..120,
            overlap_ratio in 0.0f64..0.9,
        ) {
            let overlap = ((size as f64) * overlap_ratio) as usize;
            let chunker = TextChunker::new(size, overlap).unwrap();
            let chunks = chunker.split_text(&text);

            for chunk in &chunks {
                prop_assert!(chars(chunk) <= size);
            }
            for pair in chunks.windows(2) {
                prop_assert!(chars(&pair[0]) >= overlap);
                prop_assert_eq!(tail_chars(&pair[0], overlap), pair[1].chars().take(overlap).collect::<String>());
            }

            // Dropping each repeated head rebuilds the input
            let mut rebuilt = chunks.first().cloned().unwrap_or_default();
            for chunk in chunks.iter().skip(1) {
                rebuilt.extend(chunk.chars().skip(overlap));
            }
            prop_assert_eq!(rebuilt, text);
        }
    }
}
