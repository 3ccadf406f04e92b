//! Corpus loader: recursive, sorted scan for markdown sources.

use anyhow::Result;
use paperdb_core::types::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// All `*.md` files under `root`, sorted for stable ids across runs.
pub fn collect_markdown_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("md"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

fn read_file_content(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

/// Load every markdown document under `root`.
pub fn load_documents(root: &Path) -> Result<Vec<Document>> {
    anyhow::ensure!(root.exists(), "corpus directory does not exist: {}", root.display());
    let files = collect_markdown_files(root);
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let text = read_file_content(&path)?;
        documents.push(Document { text, path });
    }
    info!(count = documents.len(), root = %root.display(), "loaded corpus documents");
    Ok(documents)
}
