//! Domain types shared by the segmentation, keyword and hybrid engines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub type ParentId = String;
pub type SegmentId = String;
pub type DocId = String;

/// A raw source document as read from disk.
///
/// Owned by the load step only; nothing retains a `Document` once
/// parent blocks have been derived from it.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub path: PathBuf,
}

/// A heading-to-next-heading span of one document; the coarse
/// retrieval/context unit.
///
/// - `id`: `{folder}__{stem}_{suffix}` where the suffix is `h0` for a
///   headingless whole document, `preface` for text before the first
///   heading, or `h{n}` (1-based) for the n-th heading block. Stable
///   across rebuilds of the same corpus.
/// - `section_header`: the heading text, empty for `h0`/`preface` blocks.
/// - `doc_title` starts as the heading text and is overwritten once
///   document-level metadata has been extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentBlock {
    pub id: ParentId,
    pub text: String,
    pub section_header: String,
    pub doc_id: DocId,
    pub doc_title: String,
    pub doc_doi: Option<String>,
    pub doc_authors: Vec<String>,
    pub source_path: String,
    pub source_folder: String,
}

/// Whether a child segment carries prose or an isolated table region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Text,
    Table,
}

/// A paragraph- or table-sized sub-unit of a parent block; the fine
/// retrieval unit offered to both the keyword and dense indexes.
///
/// Positional fields are all 1-based:
/// - `section_paragraph_index`: the paragraph/table within the parent,
///   shared by all sub-chunks of one paragraph;
/// - `section_paragraph_chunk`: the sub-chunk within its paragraph,
///   always 1 for tables;
/// - `section_segment_index`: strictly increasing emission order across
///   all segments of the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildSegment {
    pub id: SegmentId,
    pub text: String,
    pub parent_node_id: ParentId,
    #[serde(rename = "segment_type")]
    pub kind: SegmentKind,
    pub section_header: String,
    pub section_paragraph_index: usize,
    pub section_paragraph_chunk: usize,
    pub section_segment_index: usize,
    pub doc_id: DocId,
    pub doc_title: String,
    pub doc_doi: Option<String>,
    pub doc_authors: Vec<String>,
    pub source_path: String,
    pub source_folder: String,
    /// Open extension map for source-specific provenance extras.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ChildSegment {
    pub fn is_table(&self) -> bool {
        self.kind == SegmentKind::Table
    }

    /// Fill document-level fields that are still absent. Fields already
    /// carrying a value are left untouched, so enrichment at query time
    /// never clobbers values inherited at segmentation time.
    pub fn absorb_doc_metadata(&mut self, info: &DocMetadata) {
        if self.doc_title.is_empty() && !info.title.is_empty() {
            self.doc_title = info.title.clone();
        }
        if self.doc_doi.is_none() {
            self.doc_doi = info.doi.clone();
        }
        if self.doc_authors.is_empty() {
            self.doc_authors = info.authors.clone();
        }
    }
}

/// Document-level provenance, one record per `doc_id`.
///
/// Created once by metadata extraction, persisted, and reused verbatim
/// by later runs unless re-extraction is forced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocMetadata {
    pub doc_id: DocId,
    pub title: String,
    pub doi: Option<String>,
    pub authors: Vec<String>,
    pub file_path: String,
    pub folder: String,
}

impl DocMetadata {
    /// Overwrite a parent block's document-level fields with this record.
    pub fn apply_to_parent(&self, parent: &mut ParentBlock) {
        if !self.title.is_empty() {
            parent.doc_title = self.title.clone();
        }
        parent.doc_doi = self.doi.clone();
        parent.doc_authors = self.authors.clone();
    }
}

/// One merged retrieval result for a query. Ephemeral: built per query,
/// deduplicated by segment id across the dense and keyword sources.
///
/// `kw_score` is the log-compressed keyword score, `kw_raw` the raw BM25
/// score before compression, `score` the fused ranking signal.
#[derive(Debug, Clone)]
pub struct RetrievalHit {
    pub segment: ChildSegment,
    pub vec_score: f32,
    pub kw_score: f32,
    pub kw_raw: f32,
    pub score: f32,
}

impl RetrievalHit {
    pub fn new(segment: ChildSegment) -> Self {
        Self { segment, vec_score: 0.0, kw_score: 0.0, kw_raw: 0.0, score: 0.0 }
    }
}
