use paperdb_core::traits::CompletionModel;
use paperdb_core::types::ParentBlock;
use paperdb_meta::{cache, MetadataExtractor};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scripted completion stub: returns the same reply for every call and
/// counts how often it was invoked.
struct ScriptedModel {
    reply: anyhow::Result<String>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn replying(reply: &str) -> Self {
        Self { reply: Ok(reply.to_string()), calls: AtomicUsize::new(0) }
    }

    fn failing() -> Self {
        Self { reply: Err(anyhow::anyhow!("completion service unavailable")), calls: AtomicUsize::new(0) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionModel for ScriptedModel {
    fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(s) => Ok(s.clone()),
            Err(e) => Err(anyhow::anyhow!("{e}")),
        }
    }
}

fn parent(id_suffix: &str, header: &str, text: &str) -> ParentBlock {
    ParentBlock {
        id: format!("vol1__paper_{id_suffix}"),
        text: text.to_string(),
        section_header: header.to_string(),
        doc_id: "vol1__paper".to_string(),
        doc_title: header.to_string(),
        doc_doi: None,
        doc_authors: vec![],
        source_path: "vol1/paper.md".to_string(),
        source_folder: "vol1".to_string(),
    }
}

#[test]
fn doi_matched_deterministically_authors_from_completion() {
    let mut parents = vec![parent(
        "h1",
        "Title",
        "# Title\nSee doi 10.1016/S0140-6736(22)00560-1. for details.",
    )];
    let model = ScriptedModel::replying(r#"{"doi": null, "authors": ["Jane Roe", "John Doe"]}"#);
    let tmp = tempfile::TempDir::new().expect("tempdir");

    let extracted = MetadataExtractor::new()
        .extract(&mut parents, &model, tmp.path(), false)
        .expect("extract");

    let record = &extracted["vol1__paper"];
    assert_eq!(
        record.doi.as_deref(),
        Some("10.1016/S0140-6736(22)00560-1"),
        "trailing sentence punctuation trimmed"
    );
    assert_eq!(record.authors, vec!["Jane Roe".to_string(), "John Doe".to_string()]);
    assert_eq!(model.calls(), 1, "only authors were still missing");
    // Parents are backfilled in place.
    assert_eq!(parents[0].doc_doi, record.doi);
    assert_eq!(parents[0].doc_authors, record.authors);
}

#[test]
fn extraction_short_circuits_across_parents() {
    let mut parents = vec![
        parent("h1", "A", "# A\nno identifiers here"),
        parent("h2", "B", "# B\nstill nothing"),
        parent("h3", "C", "# C\nnever visited"),
    ];
    let model = ScriptedModel::replying(r#"{"doi": "10.1000/found", "authors": ["A. Author"]}"#);
    let tmp = tempfile::TempDir::new().expect("tempdir");

    MetadataExtractor::new()
        .extract(&mut parents, &model, tmp.path(), false)
        .expect("extract");
    assert_eq!(model.calls(), 1, "first parent satisfied both fields");
}

#[test]
fn second_run_reuses_cache_without_completion_calls() {
    let mut parents = vec![parent("h1", "T", "# T\nbody")];
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let extractor = MetadataExtractor::new();

    let model = ScriptedModel::replying(r#"{"doi": "10.5555/x", "authors": ["Someone"]}"#);
    let first = extractor.extract(&mut parents, &model, tmp.path(), false).expect("extract");
    assert_eq!(model.calls(), 1);

    let mut parents_again = vec![parent("h1", "T", "# T\nbody")];
    let second_model = ScriptedModel::replying(r#"{"doi": "10.9999/other", "authors": []}"#);
    let second = extractor
        .extract(&mut parents_again, &second_model, tmp.path(), false)
        .expect("extract");
    assert_eq!(second_model.calls(), 0, "cache hit must not re-invoke completion");
    assert_eq!(first, second);
    assert_eq!(parents_again[0].doc_doi.as_deref(), Some("10.5555/x"));
}

#[test]
fn forced_reextraction_ignores_cache() {
    let mut parents = vec![parent("h1", "T", "# T\nbody")];
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let extractor = MetadataExtractor::new();

    let model = ScriptedModel::replying(r#"{"doi": "10.5555/x", "authors": ["Someone"]}"#);
    extractor.extract(&mut parents, &model, tmp.path(), false).expect("extract");

    let fresh = ScriptedModel::replying(r#"{"doi": "10.9999/new", "authors": ["Else"]}"#);
    let redone = extractor.extract(&mut parents, &fresh, tmp.path(), true).expect("re-extract");
    assert!(fresh.calls() > 0);
    assert_eq!(redone["vol1__paper"].doi.as_deref(), Some("10.9999/new"));
    // The cache now holds the re-extracted record.
    assert_eq!(cache::load(tmp.path())["vol1__paper"].doi.as_deref(), Some("10.9999/new"));
}

#[test]
fn malformed_reply_means_nothing_found() {
    let mut parents = vec![parent("h1", "T", "# T\nbody")];
    let model = ScriptedModel::replying("Sorry, I could not find that information.");
    let tmp = tempfile::TempDir::new().expect("tempdir");

    let extracted = MetadataExtractor::new()
        .extract(&mut parents, &model, tmp.path(), false)
        .expect("extract");
    let record = &extracted["vol1__paper"];
    assert_eq!(record.doi, None);
    assert!(record.authors.is_empty());
}

#[test]
fn failed_completion_call_does_not_abort_the_document() {
    let mut parents = vec![
        parent("h1", "T", "# T\nno doi here"),
        parent("h2", "S", "# S\nbut the doi 10.1234/abcd is here"),
    ];
    let model = ScriptedModel::failing();
    let tmp = tempfile::TempDir::new().expect("tempdir");

    let extracted = MetadataExtractor::new()
        .extract(&mut parents, &model, tmp.path(), false)
        .expect("extract");
    let record = &extracted["vol1__paper"];
    assert_eq!(record.doi.as_deref(), Some("10.1234/abcd"), "regex still ran on later parents");
    assert!(record.authors.is_empty());
    assert_eq!(model.calls(), 2, "one failed call per parent, then end of document");
}

#[test]
fn parse_reply_extracts_embedded_json() {
    let extractor = MetadataExtractor::new();
    let fields = extractor.parse_reply(
        "Here is what I found:\n{\"doi\": \" 10.1/x \", \"authors\": [\"A\", \"\", 42]}\nHope it helps.",
    );
    assert_eq!(fields.doi.as_deref(), Some("10.1/x"));
    assert_eq!(fields.authors, vec!["A".to_string()], "non-strings and blanks dropped");
}
