//! Parent block builder: one block per heading-to-next-heading span.
//!
//! Heading policy: every ATX heading level (1-6) starts a new parent
//! block. Text before the first heading becomes a `preface` block; a
//! document without headings becomes a single `h0` block. Spans partition
//! the normalized document text, so nothing is dropped or duplicated.

use crate::patterns::{normalize_newlines, MarkdownHeadings, StructuralPattern};
use paperdb_core::types::{DocId, Document, ParentBlock};
use std::path::Path;
use tracing::debug;

pub struct ParentBuilder {
    headings: Box<dyn StructuralPattern>,
}

impl ParentBuilder {
    pub fn new() -> Self {
        Self { headings: Box::new(MarkdownHeadings::new()) }
    }

    /// Substitute an alternate heading dialect.
    pub fn with_pattern(headings: Box<dyn StructuralPattern>) -> Self {
        Self { headings }
    }

    /// Stable document identity derived from the source folder and stem.
    pub fn doc_id_for(path: &Path) -> DocId {
        let folder = path
            .parent()
            .and_then(Path::file_name)
            .map_or_else(|| "unknown_folder".to_string(), |s| s.to_string_lossy().into_owned());
        let stem = path
            .file_stem()
            .map_or_else(|| "doc".to_string(), |s| s.to_string_lossy().into_owned());
        format!("{folder}__{stem}")
    }

    /// Split one document into ordered parent blocks. Empty documents
    /// yield zero blocks; non-empty documents always yield at least one.
    pub fn build(&self, doc: &Document) -> Vec<ParentBlock> {
        let text = normalize_newlines(&doc.text);
        if text.trim().is_empty() {
            return vec![];
        }

        let doc_id = Self::doc_id_for(&doc.path);
        let source_path = doc.path.to_string_lossy().into_owned();
        let source_folder = doc
            .path
            .parent()
            .and_then(Path::file_name)
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());

        let make = |suffix: &str, block_text: &str, header: &str| ParentBlock {
            id: format!("{doc_id}_{suffix}"),
            text: block_text.trim().to_string(),
            section_header: header.to_string(),
            doc_id: doc_id.clone(),
            doc_title: header.to_string(),
            doc_doi: None,
            doc_authors: vec![],
            source_path: source_path.clone(),
            source_folder: source_folder.clone(),
        };

        let spans = self.headings.find_spans(&text);
        if spans.is_empty() {
            return vec![make("h0", &text, "")];
        }

        let mut blocks = Vec::with_capacity(spans.len() + 1);

        // Preface: text before the first heading, kept when non-blank.
        if spans[0].start > 0 && !text[..spans[0].start].trim().is_empty() {
            blocks.push(make("preface", &text[..spans[0].start], ""));
        }

        for (idx, span) in spans.iter().enumerate() {
            let end = spans.get(idx + 1).map_or(text.len(), |next| next.start);
            let header = self.headings.label_of(&text[span.start..span.end]);
            blocks.push(make(&format!("h{}", idx + 1), &text[span.start..end], &header));
        }

        debug!(doc_id = %doc_id, blocks = blocks.len(), "built parent blocks");
        blocks
    }
}

impl Default for ParentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
