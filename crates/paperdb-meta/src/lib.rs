#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Document-level metadata extraction: DOI, authors, title.
//!
//! Extraction walks each document's parent blocks in order. A DOI-shaped
//! token is matched deterministically first; the completion collaborator
//! is asked at most once per parent, only for fields still missing, and
//! the walk short-circuits as soon as everything is known. Results are
//! cached on disk; a cache hit never re-invokes the collaborator.

pub mod cache;

use paperdb_core::traits::CompletionModel;
use paperdb_core::types::{DocId, DocMetadata, ParentBlock};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Completion prompts carry at most this many characters of parent text.
const PROMPT_TEXT_CHARS: usize = 4000;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub doi: Option<String>,
    pub authors: Vec<String>,
}

pub struct MetadataExtractor {
    doi_re: Regex,
    json_re: Regex,
}

impl MetadataExtractor {
    #[allow(clippy::unwrap_used)] // patterns are compile-time constants
    pub fn new() -> Self {
        Self {
            doi_re: Regex::new(r"(?i)10\.\d{4,9}/\S+").unwrap(),
            json_re: Regex::new(r"\{[\s\S]*\}").unwrap(),
        }
    }

    /// Extract (or load cached) metadata for every document represented in
    /// `parents`, then backfill each parent block in place. Returns the
    /// per-document records, which the caller persists alongside its other
    /// state via [`cache::save`] (done here after fresh extraction).
    pub fn extract(
        &self,
        parents: &mut [ParentBlock],
        completion: &dyn CompletionModel,
        persist_dir: &Path,
        reextract: bool,
    ) -> anyhow::Result<HashMap<DocId, DocMetadata>> {
        if !reextract {
            let cached = cache::load(persist_dir);
            if !cached.is_empty() {
                debug!(docs = cached.len(), "reusing cached document metadata");
                backfill_parents(parents, &cached);
                return Ok(cached);
            }
        }

        // Group parent indices by doc_id, preserving document order.
        let mut order: Vec<DocId> = Vec::new();
        let mut groups: HashMap<DocId, Vec<usize>> = HashMap::new();
        for (idx, parent) in parents.iter().enumerate() {
            let entry = groups.entry(parent.doc_id.clone()).or_default();
            if entry.is_empty() {
                order.push(parent.doc_id.clone());
            }
            entry.push(idx);
        }

        let mut extracted: HashMap<DocId, DocMetadata> = HashMap::new();
        for doc_id in order {
            let indices = &groups[&doc_id];
            let record = self.extract_one(&doc_id, indices, parents, completion);
            extracted.insert(doc_id, record);
        }

        backfill_parents(parents, &extracted);
        cache::save(persist_dir, &extracted)?;
        Ok(extracted)
    }

    /// Walk one document's parents in order until DOI and authors are both
    /// known. Per-parent: deterministic DOI match first, then at most one
    /// completion call asking only for the fields still missing.
    fn extract_one(
        &self,
        doc_id: &str,
        indices: &[usize],
        parents: &[ParentBlock],
        completion: &dyn CompletionModel,
    ) -> DocMetadata {
        let first = &parents[indices[0]];
        let title = first.doc_title.clone();
        let file_path = first.source_path.clone();
        let folder = first.source_folder.clone();

        let mut doi: Option<String> = None;
        let mut authors: Vec<String> = Vec::new();

        for &idx in indices {
            let text = parents[idx].text.as_str();

            if doi.is_none() {
                if let Some(m) = self.doi_re.find(text) {
                    doi = Some(m.as_str().trim_end_matches(['.', ',', ')']).to_string());
                }
            }

            let need_doi = doi.is_none();
            let need_authors = authors.is_empty();
            if !need_doi && !need_authors {
                break;
            }

            let prompt = build_prompt(text, need_doi, need_authors);
            let fields = match completion.complete(&prompt) {
                Ok(raw) => self.parse_reply(&raw),
                Err(e) => {
                    // One failed call means "nothing found in this parent",
                    // not a failed document.
                    warn!(doc_id, parent = %parents[idx].id, error = %e, "completion call failed");
                    ExtractedFields::default()
                }
            };
            if need_doi {
                if let Some(found) = fields.doi {
                    doi = Some(found);
                }
            }
            if need_authors && !fields.authors.is_empty() {
                authors = fields.authors;
            }

            if doi.is_some() && !authors.is_empty() {
                break;
            }
        }

        debug!(doc_id, doi = doi.as_deref().unwrap_or("-"), authors = authors.len(), "extracted metadata");
        DocMetadata { doc_id: doc_id.to_string(), title, doi, authors, file_path, folder }
    }

    /// Pull the expected `{"doi": ..., "authors": [...]}` object out of a
    /// free-text reply. Anything unparseable degrades to "nothing found".
    pub fn parse_reply(&self, raw: &str) -> ExtractedFields {
        let Some(m) = self.json_re.find(raw) else {
            return ExtractedFields::default();
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(m.as_str()) else {
            return ExtractedFields::default();
        };
        let doi = value
            .get("doi")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let authors = value
            .get("authors")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|a| a.as_str())
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        ExtractedFields { doi, authors }
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Overwrite document-level fields on every parent that has a record.
/// Parents of unknown documents keep their segmentation-time values.
pub fn backfill_parents(parents: &mut [ParentBlock], metadata: &HashMap<DocId, DocMetadata>) {
    for parent in parents.iter_mut() {
        if let Some(info) = metadata.get(&parent.doc_id) {
            info.apply_to_parent(parent);
        }
    }
}

fn build_prompt(text: &str, need_doi: bool, need_authors: bool) -> String {
    let mut fields = Vec::new();
    if need_doi {
        fields.push("doi");
    }
    if need_authors {
        fields.push("authors");
    }
    let body: String = text.chars().take(PROMPT_TEXT_CHARS).collect();
    format!(
        "You are an information extraction assistant. Extract only the requested \
         fields from the body below and reply with a single strict JSON object, \
         no explanations or extra text. If a field is not present, set doi to \
         null and authors to [].\n\n\
         Extract only: {}\n\n\
         Reply format:\n\
         {{\n    \"doi\": <string|null>,\n    \"authors\": [<string>, ...]\n}}\n\n\
         Body:\n{}",
        fields.join(", "),
        body
    )
}
