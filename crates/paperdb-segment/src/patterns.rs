//! Pluggable structural patterns for markup detection.
//!
//! Heading and table detection are strategy objects with one job: given a
//! text, return the ordered spans of their structural regions. Alternate
//! markup dialects can be substituted without touching the builders that
//! consume the spans.

use regex::Regex;

/// A half-open byte range `[start, end)` into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

pub trait StructuralPattern: Send + Sync {
    /// Ordered, non-overlapping spans of structural regions in `text`.
    fn find_spans(&self, text: &str) -> Vec<Span>;

    /// Human-readable label for one matched region (e.g. the heading text
    /// without its markers). Defaults to the trimmed match.
    fn label_of(&self, matched: &str) -> String {
        matched.trim().to_string()
    }
}

/// ATX-style markdown headings: a line starting with 1-6 `#` markers
/// followed by whitespace and text.
pub struct MarkdownHeadings {
    re: Regex,
}

impl MarkdownHeadings {
    pub fn new() -> Self {
        #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
        let re = Regex::new(r"(?m)^(#{1,6})\s+(.*)$").unwrap();
        Self { re }
    }
}

impl Default for MarkdownHeadings {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralPattern for MarkdownHeadings {
    fn find_spans(&self, text: &str) -> Vec<Span> {
        self.re
            .find_iter(text)
            .map(|m| Span { start: m.start(), end: m.end() })
            .collect()
    }

    fn label_of(&self, matched: &str) -> String {
        matched.trim_start_matches('#').trim().to_string()
    }
}

/// HTML-like `<table>...</table>` regions, matched non-greedily and
/// case-insensitively across lines.
pub struct HtmlTables {
    re: Regex,
}

impl HtmlTables {
    pub fn new() -> Self {
        #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
        let re = Regex::new(r"(?is)<table\b.*?</table>").unwrap();
        Self { re }
    }

    /// Whether `text` is, modulo surrounding whitespace, exactly one table
    /// region.
    pub fn is_table(&self, text: &str) -> bool {
        let trimmed = text.trim();
        self.re
            .find(trimmed)
            .is_some_and(|m| m.start() == 0 && m.end() == trimmed.len())
    }
}

impl Default for HtmlTables {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralPattern for HtmlTables {
    fn find_spans(&self, text: &str) -> Vec<Span> {
        self.re
            .find_iter(text)
            .map(|m| Span { start: m.start(), end: m.end() })
            .collect()
    }
}

/// Normalize line endings to `\n`.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
