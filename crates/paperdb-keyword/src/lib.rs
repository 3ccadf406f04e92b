#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Local sparse keyword retrieval over child segments. No model, no
//! network: tokenization, BM25 ranking, and a JSON payload that is cheap
//! to reload or rebuild.

pub mod bm25;
pub mod tokenize;

use anyhow::Result;
use bm25::Bm25;
use paperdb_core::types::{ChildSegment, RetrievalHit, SegmentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokenize::{Tokenizer, DEFAULT_TOKEN_PATTERN};
use tracing::{info, warn};

const PAYLOAD_FILE: &str = "keyword_index.json";

/// Everything needed to reconstruct the index without re-tokenizing the
/// corpus: pattern, segment ids and their token lists, in index order.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub token_pattern: String,
    pub segment_ids: Vec<SegmentId>,
    pub tokenized_docs: Vec<Vec<String>>,
}

pub struct KeywordIndexer {
    tokenizer: Tokenizer,
    boost_header: bool,
    segment_ids: Vec<SegmentId>,
    tokenized_docs: Vec<Vec<String>>,
    bm25: Bm25,
    lookup: HashMap<SegmentId, ChildSegment>,
}

impl KeywordIndexer {
    #[allow(clippy::unwrap_used)] // default pattern is a compile-time constant
    pub fn new(segments: &[ChildSegment]) -> Self {
        Self::with_pattern(segments, DEFAULT_TOKEN_PATTERN, true).unwrap()
    }

    pub fn with_pattern(
        segments: &[ChildSegment],
        token_pattern: &str,
        boost_header: bool,
    ) -> Result<Self> {
        let tokenizer = Tokenizer::new(token_pattern)?;
        let lookup: HashMap<SegmentId, ChildSegment> =
            segments.iter().map(|s| (s.id.clone(), s.clone())).collect();

        let mut segment_ids = Vec::new();
        let mut tokenized_docs = Vec::new();
        for segment in segments {
            let tokens = tokenize_segment(&tokenizer, segment, boost_header);
            // Zero-token segments are excluded from the sparse path entirely.
            if tokens.is_empty() {
                continue;
            }
            segment_ids.push(segment.id.clone());
            tokenized_docs.push(tokens);
        }

        let bm25 = Bm25::new(&tokenized_docs);
        info!(indexed = segment_ids.len(), total = segments.len(), "built keyword index");
        Ok(Self { tokenizer, boost_header, segment_ids, tokenized_docs, bm25, lookup })
    }

    /// Number of segments actually indexed (zero-token segments excluded).
    pub fn len(&self) -> usize {
        self.bm25.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bm25.is_empty()
    }

    /// Ranked keyword hits for `query`. A query with no tokens matches
    /// nothing; raw scores <= 0 are dropped; surviving scores are
    /// log-compressed so they combine linearly with bounded dense scores.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<RetrievalHit> {
        if self.segment_ids.is_empty() || top_k == 0 {
            return vec![];
        }
        let q_tokens = self.tokenizer.tokenize(query);
        if q_tokens.is_empty() {
            return vec![];
        }

        let scores = self.bm25.scores(&q_tokens);
        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut hits = Vec::new();
        for (idx, raw) in ranked.into_iter().take(top_k) {
            if raw <= 0.0 {
                continue;
            }
            let Some(segment) = self.lookup.get(&self.segment_ids[idx]) else { continue };
            let mut hit = RetrievalHit::new(segment.clone());
            hit.kw_raw = raw;
            hit.kw_score = raw.ln_1p();
            hits.push(hit);
        }
        hits
    }

    pub fn to_payload(&self) -> IndexPayload {
        IndexPayload {
            kind: "bm25".to_string(),
            token_pattern: self.tokenizer.pattern().to_string(),
            segment_ids: self.segment_ids.clone(),
            tokenized_docs: self.tokenized_docs.clone(),
        }
    }

    /// Reconstruct from a persisted payload. Rankings are identical to the
    /// original build because BM25 stats derive purely from the stored
    /// token lists. `segments` supplies hit materialization; payload ids
    /// without a matching segment are skipped at retrieval time.
    pub fn from_payload(payload: IndexPayload, segments: &[ChildSegment]) -> Result<Self> {
        let tokenizer = Tokenizer::new(&payload.token_pattern)?;
        anyhow::ensure!(
            payload.segment_ids.len() == payload.tokenized_docs.len(),
            "keyword payload is inconsistent: {} ids vs {} token lists",
            payload.segment_ids.len(),
            payload.tokenized_docs.len()
        );
        let lookup: HashMap<SegmentId, ChildSegment> =
            segments.iter().map(|s| (s.id.clone(), s.clone())).collect();
        let bm25 = Bm25::new(&payload.tokenized_docs);
        Ok(Self {
            tokenizer,
            boost_header: true,
            segment_ids: payload.segment_ids,
            tokenized_docs: payload.tokenized_docs,
            bm25,
            lookup,
        })
    }

    pub fn persist(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let target = dir.join(PAYLOAD_FILE);
        let json = serde_json::to_string(&self.to_payload())?;
        std::fs::write(&target, json)?;
        Ok(())
    }

    /// Load a persisted index if one exists and parses; `None` means the
    /// caller should rebuild from segments (equally valid and cheap).
    pub fn load(dir: &Path, segments: &[ChildSegment]) -> Option<Self> {
        let target = dir.join(PAYLOAD_FILE);
        let json = std::fs::read_to_string(&target).ok()?;
        let payload: IndexPayload = match serde_json::from_str(&json) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %target.display(), error = %e, "keyword payload unreadable, rebuilding");
                return None;
            }
        };
        match Self::from_payload(payload, segments) {
            Ok(indexer) => Some(indexer),
            Err(e) => {
                warn!(error = %e, "keyword payload inconsistent, rebuilding");
                None
            }
        }
    }

    pub fn boost_header(&self) -> bool {
        self.boost_header
    }
}

/// Token stream for one segment: the section header is repeated twice in
/// front of the text so header terms weigh more in ranking.
fn tokenize_segment(tokenizer: &Tokenizer, segment: &ChildSegment, boost_header: bool) -> Vec<String> {
    let header = segment.section_header.as_str();
    let combined = if header.is_empty() {
        segment.text.clone()
    } else if boost_header {
        format!("{header} {header} {}", segment.text)
    } else {
        format!("{header} {}", segment.text)
    };
    tokenizer.tokenize(&combined)
}
