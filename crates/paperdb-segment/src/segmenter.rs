//! Splits one parent block into ordered child segments.
//!
//! Table regions are isolated first and emitted as atomic segments; the
//! remaining prose is split into paragraphs on blank lines, and each
//! paragraph is handed to the sentence-respecting chunker. Every emitted
//! text passes through a hard character cap so downstream embedding
//! consumers never see over-long inputs.

use crate::chunker::ParagraphChunker;
use crate::patterns::{normalize_newlines, HtmlTables, StructuralPattern};
use paperdb_core::types::{ChildSegment, ParentBlock, SegmentKind};
use regex::Regex;

/// Embedding caps below this are clamped up; a lower cap would truncate
/// mid-paragraph routinely.
pub const MIN_EMBED_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Soft target for paragraph sub-chunks, in characters.
    pub paragraph_chunk_chars: usize,
    /// Hard cap applied to every emitted segment text.
    pub max_embed_chars: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self { paragraph_chunk_chars: 1200, max_embed_chars: 6000 }
    }
}

pub struct Segmenter {
    tables: HtmlTables,
    chunker: ParagraphChunker,
    paragraph_re: Regex,
    max_embed_chars: usize,
}

impl Segmenter {
    pub fn new(config: &SegmenterConfig) -> Self {
        #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
        let paragraph_re = Regex::new(r"\n\s*\n").unwrap();
        Self {
            tables: HtmlTables::new(),
            chunker: ParagraphChunker::new(config.paragraph_chunk_chars),
            paragraph_re,
            max_embed_chars: config.max_embed_chars.max(MIN_EMBED_CHARS),
        }
    }

    /// Hard cut at the cap; truncation is a plain prefix, not summarization.
    fn truncate_for_embedding(&self, text: &str) -> String {
        match text.char_indices().nth(self.max_embed_chars) {
            Some((byte_idx, _)) => text[..byte_idx].to_string(),
            None => text.to_string(),
        }
    }

    /// Produce the ordered child segments of one parent block.
    pub fn segment_parent(&self, parent: &ParentBlock) -> Vec<ChildSegment> {
        let mut segments = Vec::new();
        let mut paragraph_index = 0usize;
        let mut segment_counter = 0usize;

        let make = |id: String,
                    text: String,
                    kind: SegmentKind,
                    paragraph_index: usize,
                    paragraph_chunk: usize,
                    segment_index: usize| ChildSegment {
            id,
            text,
            parent_node_id: parent.id.clone(),
            kind,
            section_header: parent.section_header.clone(),
            section_paragraph_index: paragraph_index,
            section_paragraph_chunk: paragraph_chunk,
            section_segment_index: segment_index,
            doc_id: parent.doc_id.clone(),
            doc_title: parent.doc_title.clone(),
            doc_doi: parent.doc_doi.clone(),
            doc_authors: parent.doc_authors.clone(),
            source_path: parent.source_path.clone(),
            source_folder: parent.source_folder.clone(),
            extra: Default::default(),
        };

        for piece in split_on_spans(&parent.text, &self.tables.find_spans(&parent.text)) {
            if piece.trim().is_empty() {
                continue;
            }

            if self.tables.is_table(piece) {
                paragraph_index += 1;
                segment_counter += 1;
                segments.push(make(
                    format!("{}_tbl{}", parent.id, paragraph_index),
                    self.truncate_for_embedding(piece.trim()),
                    SegmentKind::Table,
                    paragraph_index,
                    1,
                    segment_counter,
                ));
                continue;
            }

            let cleaned = normalize_newlines(piece);
            for paragraph in self.paragraph_re.split(&cleaned) {
                let paragraph = paragraph.trim();
                if paragraph.is_empty() {
                    continue;
                }
                paragraph_index += 1;
                for (chunk_order, chunk_text) in self.chunker.chunk(paragraph).into_iter().enumerate() {
                    segment_counter += 1;
                    segments.push(make(
                        format!("{}_p{}_{}", parent.id, paragraph_index, chunk_order + 1),
                        self.truncate_for_embedding(&chunk_text),
                        SegmentKind::Text,
                        paragraph_index,
                        chunk_order + 1,
                        segment_counter,
                    ));
                }
            }
        }

        segments
    }

    /// Segment a whole corpus of parents, preserving parent order.
    pub fn segment_all(&self, parents: &[ParentBlock]) -> Vec<ChildSegment> {
        parents.iter().flat_map(|p| self.segment_parent(p)).collect()
    }
}

/// Cut `text` into alternating outside/inside pieces around the given
/// spans, in order. Spans are assumed ordered and non-overlapping.
fn split_on_spans<'a>(text: &'a str, spans: &[crate::patterns::Span]) -> Vec<&'a str> {
    let mut pieces = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;
    for span in spans {
        if span.start > cursor {
            pieces.push(&text[cursor..span.start]);
        }
        pieces.push(&text[span.start..span.end]);
        cursor = span.end;
    }
    if cursor < text.len() {
        pieces.push(&text[cursor..]);
    }
    pieces
}
