//! Offline default collaborators: a deterministic hashing embedder and an
//! exhaustive cosine index persisted as JSON.
//!
//! These exist so the workspace runs end-to-end with no network or model
//! weights. Production deployments plug real implementations into the
//! same traits.

use anyhow::Result;
use paperdb_core::traits::{DenseIndex, Embedder};
use paperdb_core::types::{ChildSegment, SegmentId};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::info;

const INDEX_FILE: &str = "dense_index.json";

/// Bag-of-words embedder: tokens are hashed into `dim` buckets and the
/// resulting count vector is L2-normalized. Deterministic across runs.
pub struct HashEmbedder {
    id: String,
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { id: format!("local:hash:d{dim}"), dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

impl HashEmbedder {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.len() < 2 {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            v[(hasher.finish() % self.dim as u64) as usize] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[derive(Serialize, Deserialize)]
struct FlatEntry {
    id: SegmentId,
    vector: Vec<f32>,
}

/// Exhaustive cosine-similarity index over normalized vectors.
#[derive(Default)]
pub struct FlatDenseIndex {
    entries: Vec<FlatEntry>,
    ready: bool,
}

impl FlatDenseIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DenseIndex for FlatDenseIndex {
    fn index(&mut self, segments: &[ChildSegment], embeddings: &[Vec<f32>]) -> Result<()> {
        anyhow::ensure!(
            segments.len() == embeddings.len(),
            "segment/embedding count mismatch: {} vs {}",
            segments.len(),
            embeddings.len()
        );
        self.entries = segments
            .iter()
            .zip(embeddings)
            .map(|(s, v)| FlatEntry { id: s.id.clone(), vector: v.clone() })
            .collect();
        self.ready = true;
        info!(entries = self.entries.len(), "dense index built");
        Ok(())
    }

    fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<(SegmentId, f32)>> {
        let mut scored: Vec<(SegmentId, f32)> = self
            .entries
            .iter()
            .map(|e| {
                let dot: f32 = e.vector.iter().zip(query_vec).map(|(a, b)| a * b).sum();
                (e.id.clone(), dot)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn persist(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string(&self.entries)?;
        std::fs::write(dir.join(INDEX_FILE), json)?;
        Ok(())
    }

    fn load(&mut self, dir: &Path) -> Result<bool> {
        let path = dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(false);
        }
        let json = std::fs::read_to_string(&path)?;
        self.entries = serde_json::from_str(&json)?;
        self.ready = true;
        info!(entries = self.entries.len(), "dense index loaded");
        Ok(true)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
