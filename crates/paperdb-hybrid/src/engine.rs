//! The retrieval engine facade: `build` over a corpus directory, `query`
//! with fused dense+keyword ranking.

use anyhow::Result;
use paperdb_core::error::Error;
use paperdb_core::traits::{CompletionModel, DenseIndex, Embedder};
use paperdb_core::types::{
    ChildSegment, DocId, DocMetadata, ParentId, RetrievalHit, SegmentId,
};
use paperdb_keyword::KeywordIndexer;
use paperdb_meta::MetadataExtractor;
use paperdb_segment::{loader, ParentBuilder, Segmenter, SegmenterConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PARENT_MAP_FILE: &str = "parent_text_map.json";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub force_rebuild: bool,
    pub build_keyword_index: bool,
    pub reextract_doc_meta: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { force_rebuild: false, build_keyword_index: true, reextract_doc_meta: false }
    }
}

/// Request-time overrides. Defaults follow the tuned production values:
/// wide per-source fan-out, a small merged result set, and fusion weights
/// leaning on the dense signal.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub top_k_vector: usize,
    pub top_k_keyword: usize,
    pub merge_top_k: usize,
    pub alpha: f32,
    pub beta: f32,
    pub use_keyword: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k_vector: 20,
            top_k_keyword: 20,
            merge_top_k: 5,
            alpha: 0.85,
            beta: 0.15,
            use_keyword: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildSummary {
    pub documents: usize,
    pub parents: usize,
    pub segments: usize,
    pub dense_reloaded: bool,
}

pub struct RetrievalEngine {
    persist_dir: PathBuf,
    segmenter_config: SegmenterConfig,
    embedder: Box<dyn Embedder>,
    dense: Box<dyn DenseIndex>,
    completion: Box<dyn CompletionModel>,
    keyword: Option<KeywordIndexer>,
    parent_text_map: HashMap<ParentId, String>,
    doc_metadata: HashMap<DocId, DocMetadata>,
    segment_lookup: HashMap<SegmentId, ChildSegment>,
}

impl RetrievalEngine {
    pub fn new(
        persist_dir: impl Into<PathBuf>,
        segmenter_config: SegmenterConfig,
        embedder: Box<dyn Embedder>,
        dense: Box<dyn DenseIndex>,
        completion: Box<dyn CompletionModel>,
    ) -> Self {
        Self {
            persist_dir: persist_dir.into(),
            segmenter_config,
            embedder,
            dense,
            completion,
            keyword: None,
            parent_text_map: HashMap::new(),
            doc_metadata: HashMap::new(),
            segment_lookup: HashMap::new(),
        }
    }

    /// Build (or reload) all indexes for the corpus under `corpus_dir`.
    ///
    /// When not forcing a rebuild and the dense collaborator can restore
    /// itself from the persist dir, embeddings are not recomputed; parents
    /// and segments are rebuilt locally (cheap, no external calls) and the
    /// keyword payload is reloaded or rebuilt. A failure on any document
    /// fails the whole build before anything is persisted.
    pub fn build(&mut self, corpus_dir: &Path, options: &BuildOptions) -> Result<BuildSummary> {
        let documents = loader::load_documents(corpus_dir)?;
        let builder = ParentBuilder::new();
        let mut parents: Vec<_> = documents.iter().flat_map(|d| builder.build(d)).collect();

        self.doc_metadata = MetadataExtractor::new().extract(
            &mut parents,
            self.completion.as_ref(),
            &self.persist_dir,
            options.reextract_doc_meta,
        )?;

        self.parent_text_map =
            parents.iter().map(|p| (p.id.clone(), p.text.clone())).collect();

        // Parents are already backfilled, so segments inherit provenance here.
        let segments = Segmenter::new(&self.segmenter_config).segment_all(&parents);
        self.segment_lookup = segments.iter().map(|s| (s.id.clone(), s.clone())).collect();

        let dense_reloaded =
            !options.force_rebuild && self.dense.load(&self.persist_dir)?;
        if !dense_reloaded {
            let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;
            self.dense.index(&segments, &embeddings)?;
            self.dense.persist(&self.persist_dir)?;
        }

        self.keyword = if options.build_keyword_index {
            let indexer = match KeywordIndexer::load(&self.persist_dir, &segments) {
                Some(loaded) if dense_reloaded => loaded,
                _ => {
                    let built = KeywordIndexer::new(&segments);
                    built.persist(&self.persist_dir)?;
                    built
                }
            };
            Some(indexer)
        } else {
            None
        };

        self.persist_parent_map()?;

        let summary = BuildSummary {
            documents: documents.len(),
            parents: parents.len(),
            segments: segments.len(),
            dense_reloaded,
        };
        info!(
            documents = summary.documents,
            parents = summary.parents,
            segments = summary.segments,
            dense_reloaded,
            "build complete"
        );
        Ok(summary)
    }

    /// Dual retrieval with weighted-sum fusion.
    ///
    /// Merging is by segment identity: a segment surfaced by both sources
    /// keeps the maximum of each component score, never a sum. Fused
    /// score is `alpha * vec_score + beta * kw_score`; ordering is a
    /// stable descending sort truncated to `merge_top_k`.
    pub fn query(&self, question: &str, options: &QueryOptions) -> Result<Vec<RetrievalHit>> {
        if options.alpha < 0.0 || options.beta < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "fusion weights must be non-negative (alpha={}, beta={})",
                options.alpha, options.beta
            ))
            .into());
        }
        if !self.dense.is_ready() {
            return Err(Error::Precondition(
                "dense index not built; call build() first".to_string(),
            )
            .into());
        }
        if options.use_keyword && self.keyword.is_none() {
            return Err(Error::Precondition(
                "keyword index not built; call build() with build_keyword_index".to_string(),
            )
            .into());
        }

        let mut query_vecs = self.embedder.embed_batch(&[question.to_string()])?;
        anyhow::ensure!(!query_vecs.is_empty(), "embedder returned no vector for the query");
        let query_vec = query_vecs.remove(0);
        let vec_hits = self.dense.search(&query_vec, options.top_k_vector)?;

        let kw_hits = match (&self.keyword, options.use_keyword, options.top_k_keyword) {
            (Some(keyword), true, top_k) if top_k > 0 => keyword.retrieve(question, top_k),
            _ => vec![],
        };

        let mut merged: HashMap<SegmentId, RetrievalHit> = HashMap::new();
        let mut order: Vec<SegmentId> = Vec::new();

        for (id, score) in vec_hits {
            let Some(segment) = self.segment_lookup.get(&id) else {
                debug!(segment = %id, "dense hit has no segment in the current corpus");
                continue;
            };
            let hit = merged.entry(id.clone()).or_insert_with(|| {
                order.push(id.clone());
                RetrievalHit::new(segment.clone())
            });
            hit.vec_score = hit.vec_score.max(score);
        }
        for kw in kw_hits {
            let id = kw.segment.id.clone();
            let hit = merged.entry(id.clone()).or_insert_with(|| {
                order.push(id.clone());
                RetrievalHit::new(kw.segment.clone())
            });
            hit.kw_score = hit.kw_score.max(kw.kw_score);
            hit.kw_raw = hit.kw_raw.max(kw.kw_raw);
        }

        // Insertion-ordered collection keeps the sort stable and the
        // output deterministic for equal fused scores.
        let mut hits: Vec<RetrievalHit> = Vec::with_capacity(order.len());
        for id in order {
            if let Some(mut hit) = merged.remove(&id) {
                self.enrich_segment(&mut hit.segment);
                hit.score = options.alpha * hit.vec_score + options.beta * hit.kw_score;
                hits.push(hit);
            }
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(options.merge_top_k);
        Ok(hits)
    }

    /// Lazy backfill for segments built from a stale parent snapshot.
    /// Unknown documents are left as-is rather than erroring.
    fn enrich_segment(&self, segment: &mut ChildSegment) {
        if let Some(info) = self.doc_metadata.get(&segment.doc_id) {
            segment.absorb_doc_metadata(info);
        }
    }

    pub fn parent_text(&self, parent_node_id: &str) -> Option<&str> {
        self.parent_text_map.get(parent_node_id).map(String::as_str)
    }

    pub fn doc_info(&self, doc_id: &str) -> Option<&DocMetadata> {
        self.doc_metadata.get(doc_id)
    }

    /// Parent-level context for answer grounding: deduplicate hits by
    /// parent id, keep first-seen order, fall back to the segment text
    /// when a parent is unknown.
    pub fn context_from_parents(&self, hits: &[RetrievalHit]) -> String {
        let mut seen: Vec<&str> = Vec::new();
        let mut parts: Vec<&str> = Vec::new();
        for hit in hits {
            let pid = hit.segment.parent_node_id.as_str();
            if seen.contains(&pid) {
                continue;
            }
            seen.push(pid);
            parts.push(self.parent_text(pid).unwrap_or(hit.segment.text.as_str()));
        }
        parts.join("\n\n")
    }

    fn persist_parent_map(&self) -> Result<()> {
        if self.parent_text_map.is_empty() {
            return Ok(());
        }
        let target = self.persist_dir.join(PARENT_MAP_FILE);
        let as_storage = |source: std::io::Error| Error::Storage {
            path: target.display().to_string(),
            source,
        };
        std::fs::create_dir_all(&self.persist_dir).map_err(as_storage)?;
        let json = serde_json::to_string(&self.parent_text_map)?;
        std::fs::write(&target, json).map_err(as_storage)?;
        Ok(())
    }
}
