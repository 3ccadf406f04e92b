//! Collaborator contracts consumed by the hybrid engine.
//!
//! Embedding, dense indexing and completion are opaque, potentially
//! network-bound services. The engine only ever talks to these traits;
//! implementations may call a local model, a remote API, or a test stub.

use crate::types::{ChildSegment, SegmentId};
use std::path::Path;

pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g., `local:hash:d256`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Compute embeddings for a batch of input texts.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Opaque dense store: indexes embedded segments, answers ranked
/// similarity queries, and can persist/load itself at a directory.
pub trait DenseIndex: Send + Sync {
    fn index(&mut self, segments: &[ChildSegment], embeddings: &[Vec<f32>]) -> anyhow::Result<()>;
    /// Ranked `(segment_id, similarity)` pairs, best first.
    fn search(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<(SegmentId, f32)>>;
    fn persist(&self, dir: &Path) -> anyhow::Result<()>;
    /// Restore previously persisted state. Returns `false` when nothing
    /// usable was found at `dir`.
    fn load(&mut self, dir: &Path) -> anyhow::Result<bool>;
    fn is_ready(&self) -> bool;
}

pub trait CompletionModel: Send + Sync {
    fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
