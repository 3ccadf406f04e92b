//! Disk cache for document-level metadata, one JSON map per persist dir.

use paperdb_core::types::{DocId, DocMetadata};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

const CACHE_FILE: &str = "doc_metadata.json";

/// Load the persisted metadata map. Missing or unreadable files mean an
/// empty cache, never an error: the caller just re-extracts.
pub fn load(persist_dir: &Path) -> HashMap<DocId, DocMetadata> {
    let path = persist_dir.join(CACHE_FILE);
    let Ok(json) = std::fs::read_to_string(&path) else {
        return HashMap::new();
    };
    match serde_json::from_str(&json) {
        Ok(map) => map,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "metadata cache unreadable, ignoring");
            HashMap::new()
        }
    }
}

pub fn save(persist_dir: &Path, metadata: &HashMap<DocId, DocMetadata>) -> anyhow::Result<()> {
    if metadata.is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(persist_dir)?;
    let json = serde_json::to_string(metadata)?;
    std::fs::write(persist_dir.join(CACHE_FILE), json)?;
    Ok(())
}
