use std::env;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use paperdb_core::config::{expand_path, Config};
use paperdb_core::traits::CompletionModel;
use paperdb_hybrid::dense::{FlatDenseIndex, HashEmbedder};
use paperdb_hybrid::{BuildOptions, QueryOptions, RetrievalEngine};
use paperdb_segment::SegmenterConfig;

/// Offline stand-in for a real completion service: reports every field as
/// not found, so metadata extraction degrades to the deterministic DOI
/// match. Swap in a networked implementation for full extraction.
struct OfflineCompletion;

impl CompletionModel for OfflineCompletion {
    fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok(r#"{"doi": null, "authors": []}"#.to_string())
    }
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {prog} <ingest|query> [args...]");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn make_engine(config: &Config) -> RetrievalEngine {
    let persist: String = config.get_or("data.persist_dir", "./storage".to_string());
    let segmenter_config = SegmenterConfig {
        paragraph_chunk_chars: config.get_or("chunking.paragraph_chunk_chars", 1200),
        max_embed_chars: config.get_or("chunking.max_embed_chars", 6000),
    };
    RetrievalEngine::new(
        expand_path(&persist),
        segmenter_config,
        Box::new(HashEmbedder::default()),
        Box::new(FlatDenseIndex::new()),
        Box::new(OfflineCompletion),
    )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => {
            let corpus_dir = args.first().map(PathBuf::from).unwrap_or_else(|| {
                let dir: String = config.get_or("data.corpus_dir", "./corpus".to_string());
                expand_path(&dir)
            });
            println!("Ingesting markdown from {}", corpus_dir.display());

            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {elapsed_precise} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message("building indexes...");
            pb.enable_steady_tick(std::time::Duration::from_millis(120));

            let mut engine = make_engine(&config);
            let force_rebuild = args.iter().any(|a| a == "--force");
            let summary =
                engine.build(&corpus_dir, &BuildOptions { force_rebuild, ..Default::default() })?;
            pb.finish_and_clear();
            println!(
                "Ingest complete: {} documents, {} parent blocks, {} segments{}",
                summary.documents,
                summary.parents,
                summary.segments,
                if summary.dense_reloaded { " (dense index reloaded)" } else { "" }
            );
        }
        "query" => {
            let question = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: paperdb query \"<question>\" [top_k]");
                std::process::exit(1)
            });
            let merge_top_k = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(5);

            let corpus_dir: String = config.get_or("data.corpus_dir", "./corpus".to_string());
            let mut engine = make_engine(&config);
            engine.build(&expand_path(&corpus_dir), &BuildOptions::default())?;

            let options = QueryOptions {
                merge_top_k,
                alpha: config.get_or("retrieval.alpha", 0.85),
                beta: config.get_or("retrieval.beta", 0.15),
                ..Default::default()
            };
            let hits = engine.query(&question, &options)?;
            if hits.is_empty() {
                println!("No results.");
            }
            for (rank, hit) in hits.iter().enumerate() {
                let seg = &hit.segment;
                println!(
                    "{}. [{:.4}] (vec {:.4} / kw {:.4}) {} | {}",
                    rank + 1,
                    hit.score,
                    hit.vec_score,
                    hit.kw_score,
                    seg.id,
                    seg.doc_title
                );
                let preview: String = seg.text.chars().take(160).collect();
                println!("   {preview}");
                if let Some(doi) = &seg.doc_doi {
                    println!("   doi: {doi}");
                }
            }
        }
        _ => {
            eprintln!("Unknown command: {cmd}");
            std::process::exit(1);
        }
    }
    Ok(())
}
