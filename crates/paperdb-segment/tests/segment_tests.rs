use paperdb_core::types::{Document, SegmentKind};
use paperdb_segment::patterns::{HtmlTables, MarkdownHeadings, StructuralPattern};
use paperdb_segment::{ParagraphChunker, ParentBuilder, Segmenter, SegmenterConfig};
use std::path::PathBuf;

fn doc(text: &str) -> Document {
    Document { text: text.to_string(), path: PathBuf::from("vol1/paper.md") }
}

fn non_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

// --- structural patterns ---

#[test]
fn headings_match_levels_one_through_six() {
    let p = MarkdownHeadings::new();
    let text = "# one\nbody\n###### six\n####### seven hashes\n";
    let spans = p.find_spans(text);
    assert_eq!(spans.len(), 2, "7+ markers are not a heading");
    assert_eq!(p.label_of(&text[spans[0].start..spans[0].end]), "one");
    assert_eq!(p.label_of(&text[spans[1].start..spans[1].end]), "six");
}

#[test]
fn tables_are_found_across_lines() {
    let p = HtmlTables::new();
    let text = "before\n<TABLE class=\"x\">\n<tr/>\n</table>\nafter";
    let spans = p.find_spans(text);
    assert_eq!(spans.len(), 1);
    assert!(p.is_table(&text[spans[0].start..spans[0].end]));
    assert!(!p.is_table(text));
}

// --- parent builder ---

#[test]
fn every_heading_level_starts_a_parent() {
    let builder = ParentBuilder::new();
    let blocks = builder.build(&doc("# A\ntext1\n\n## summary\ntext2\n# B\ntext3"));
    let headers: Vec<&str> = blocks.iter().map(|b| b.section_header.as_str()).collect();
    assert_eq!(headers, vec!["A", "summary", "B"]);
    assert!(blocks[0].text.starts_with("# A"));
    assert!(blocks[1].text.starts_with("## summary"));
    assert_eq!(blocks[0].id, "vol1__paper_h1");
    assert_eq!(blocks[2].id, "vol1__paper_h3");
}

#[test]
fn parents_partition_the_document() {
    let text = "intro line\n\n# First\nbody one\n\n<table><tr/></table>\n\n## Second\r\nbody two\n";
    let builder = ParentBuilder::new();
    let blocks = builder.build(&doc(text));
    assert_eq!(blocks[0].id, "vol1__paper_preface");
    assert_eq!(blocks[0].section_header, "");
    let joined: String = blocks.iter().map(|b| b.text.as_str()).collect();
    let normalized = text.replace("\r\n", "\n");
    assert_eq!(non_ws(&joined), non_ws(&normalized), "no text dropped or duplicated");
}

#[test]
fn headingless_document_becomes_one_block() {
    let blocks = ParentBuilder::new().build(&doc("plain body\nwith lines\n"));
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].id, "vol1__paper_h0");
    assert_eq!(blocks[0].section_header, "");
    assert_eq!(blocks[0].doc_title, "");
}

#[test]
fn empty_document_yields_no_blocks() {
    assert!(ParentBuilder::new().build(&doc("   \n\n  ")).is_empty());
}

#[test]
fn rebuilds_produce_identical_ids() {
    let d = doc("# A\none\n# B\ntwo");
    let first = ParentBuilder::new().build(&d);
    let second = ParentBuilder::new().build(&d);
    let ids_a: Vec<_> = first.iter().map(|b| b.id.clone()).collect();
    let ids_b: Vec<_> = second.iter().map(|b| b.id.clone()).collect();
    assert_eq!(ids_a, ids_b);
}

// --- paragraph chunker ---

#[test]
fn single_short_sentence_is_returned_unmodified() {
    let chunker = ParagraphChunker::new(1200);
    let chunks = chunker.chunk("A single short sentence.");
    assert_eq!(chunks, vec!["A single short sentence.".to_string()]);
}

#[test]
fn limit_is_clamped_to_floor() {
    let chunker = ParagraphChunker::new(10);
    assert_eq!(chunker.limit(), 200);
}

#[test]
fn long_paragraph_splits_at_sentence_boundaries() {
    // ~3000 chars of uniform short sentences, limit 1200.
    let sentence = "The quick brown fox jumps over the lazy dog near the river bank today.";
    let n = 3000 / (sentence.len() + 1) + 1;
    let paragraph = vec![sentence; n].join(" ");
    assert!(paragraph.len() >= 3000);

    let chunker = ParagraphChunker::new(1200);
    let chunks = chunker.chunk(&paragraph);
    assert!(chunks.len() >= 3, "expected >=3 chunks, got {}", chunks.len());
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 1200);
        assert!(chunk.ends_with('.'), "chunk must end at a sentence boundary: {chunk:?}");
    }
    // Reassembly loses nothing.
    assert_eq!(chunks.join(" "), paragraph);
}

#[test]
fn oversize_sentence_is_flushed_alone_verbatim() {
    let giant = format!("{}.", "word ".repeat(100).trim());
    assert!(giant.len() > 200);
    let chunker = ParagraphChunker::new(200);
    let chunks = chunker.chunk(&format!("Short lead. {giant} Short tail."));
    assert!(chunks.contains(&giant), "oversize sentence must appear verbatim");
    for chunk in &chunks {
        if chunk != &giant {
            assert!(chunk.chars().count() <= 200);
        }
    }
}

#[test]
fn cjk_terminators_end_sentences() {
    let chunker = ParagraphChunker::new(200);
    let text = format!("{} 这是第二句。 {}", "前一句话。".repeat(50), "尾句。");
    let chunks = chunker.chunk(&text);
    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.ends_with('。'), "chunk should end on a sentence: {chunk:?}");
    }
}

// --- segmenter ---

fn parent_for(text: &str) -> paperdb_core::types::ParentBlock {
    let mut blocks = ParentBuilder::new().build(&doc(text));
    assert_eq!(blocks.len(), 1);
    blocks.remove(0)
}

#[test]
fn tables_are_atomic_segments() {
    let parent = parent_for(
        "# Results\nFirst paragraph here.\n\n<table>\n<tr><td>1</td></tr>\n</table>\n\nSecond paragraph here.",
    );
    let segmenter = Segmenter::new(&SegmenterConfig::default());
    let segments = segmenter.segment_parent(&parent);

    let kinds: Vec<SegmentKind> = segments.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![SegmentKind::Text, SegmentKind::Table, SegmentKind::Text]);

    let table = &segments[1];
    assert!(table.is_table());
    assert!(table.text.starts_with("<table>"));
    assert_eq!(table.section_paragraph_chunk, 1);
    assert_eq!(table.id, format!("{}_tbl{}", parent.id, table.section_paragraph_index));
}

#[test]
fn segment_indices_are_contiguous_from_one() {
    let parent = parent_for("# S\npara one.\n\npara two.\n\n<table></table>\n\npara three.");
    let segments = Segmenter::new(&SegmenterConfig::default()).segment_parent(&parent);
    for (i, seg) in segments.iter().enumerate() {
        assert_eq!(seg.section_segment_index, i + 1);
        assert_eq!(seg.parent_node_id, parent.id);
        assert_eq!(seg.section_header, "S");
    }
    // Four paragraphs/tables in total, each a single chunk.
    assert_eq!(segments.last().map(|s| s.section_paragraph_index), Some(4));
}

#[test]
fn paragraph_chunks_share_paragraph_index() {
    let sentence = "A sentence of a reasonably ordinary length to fill the buffer quickly.";
    let long_paragraph = vec![sentence; 40].join(" ");
    let parent = parent_for(&format!("# S\n{long_paragraph}"));
    let config = SegmenterConfig { paragraph_chunk_chars: 300, ..Default::default() };
    let segments = Segmenter::new(&config).segment_parent(&parent);

    assert!(segments.len() > 1);
    for (i, seg) in segments.iter().enumerate() {
        assert_eq!(seg.section_paragraph_index, 1, "one source paragraph");
        assert_eq!(seg.section_paragraph_chunk, i + 1);
        assert_eq!(seg.id, format!("{}_p1_{}", parent.id, i + 1));
    }
}

#[test]
fn segment_text_is_capped_for_embedding() {
    let huge = "x".repeat(9000);
    let parent = parent_for(&format!("# S\n{huge}"));
    let segments = Segmenter::new(&SegmenterConfig::default()).segment_parent(&parent);
    assert_eq!(segments.len(), 1, "one unbreakable sentence");
    assert_eq!(segments[0].text.chars().count(), 6000);
}

#[test]
fn segments_inherit_parent_provenance() {
    let mut parent = parent_for("# S\nbody text here.");
    parent.doc_title = "Real Title".to_string();
    parent.doc_doi = Some("10.1000/abc".to_string());
    parent.doc_authors = vec!["A. B.".to_string()];
    let segments = Segmenter::new(&SegmenterConfig::default()).segment_parent(&parent);
    assert_eq!(segments[0].doc_title, "Real Title");
    assert_eq!(segments[0].doc_doi.as_deref(), Some("10.1000/abc"));
    assert_eq!(segments[0].source_folder, "vol1");
}

// --- loader ---

#[test]
fn loader_collects_sorted_markdown_only() {
    let tmp = tempfile::TempDir::new().expect("tempdir");
    std::fs::create_dir(tmp.path().join("b")).expect("mkdir");
    std::fs::write(tmp.path().join("b/doc.md"), "# B doc").expect("write");
    std::fs::write(tmp.path().join("a.md"), "# A doc").expect("write");
    std::fs::write(tmp.path().join("notes.txt"), "ignored").expect("write");

    let docs = paperdb_segment::loader::load_documents(tmp.path()).expect("load");
    assert_eq!(docs.len(), 2);
    assert!(docs[0].path.ends_with("a.md"));
    assert!(docs[1].path.ends_with("b/doc.md"));
}
