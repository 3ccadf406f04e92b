//! Sentence-respecting paragraph chunker.
//!
//! Splits one paragraph into the minimum number of sub-chunks such that no
//! output exceeds the character limit, breaking only at sentence
//! boundaries. Chunk size is a soft target; sentence integrity is the hard
//! constraint, so a single sentence longer than the limit is emitted alone
//! rather than cut mid-sentence.

use crate::patterns::normalize_newlines;
use regex::Regex;

/// Limits below this are clamped up; tiny limits would shred prose into
/// fragments useless for retrieval.
pub const MIN_CHUNK_CHARS: usize = 200;

pub struct ParagraphChunker {
    limit: usize,
    boundary: Regex,
}

impl ParagraphChunker {
    pub fn new(limit: usize) -> Self {
        // Sentence end: CJK or latin terminal punctuation followed by
        // whitespace. The terminator stays with the sentence it ends.
        #[allow(clippy::unwrap_used)] // pattern is a compile-time constant
        let boundary = Regex::new(r"[。！？!?.]\s+").unwrap();
        Self { limit: limit.max(MIN_CHUNK_CHARS), boundary }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Split `paragraph` into sentences, keeping terminal punctuation.
    fn sentences<'a>(&self, paragraph: &'a str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut start = 0;
        for m in self.boundary.find_iter(paragraph) {
            // The match begins with exactly one terminator char; the split
            // point sits right after it so the terminator is kept.
            let punct_len = paragraph[m.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            let end = m.start() + punct_len;
            let s = paragraph[start..end].trim();
            if !s.is_empty() {
                out.push(s);
            }
            start = m.end();
        }
        let tail = paragraph[start..].trim();
        if !tail.is_empty() {
            out.push(tail);
        }
        out
    }

    /// Chunk one paragraph. Empty input yields no chunks; a paragraph that
    /// is a single sentence within the limit is returned unmodified.
    pub fn chunk(&self, paragraph: &str) -> Vec<String> {
        let paragraph = normalize_newlines(paragraph);
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            return vec![];
        }

        let sentences = self.sentences(paragraph);
        if sentences.len() == 1 && char_len(sentences[0]) <= self.limit {
            return vec![sentences[0].to_string()];
        }

        let mut chunks: Vec<String> = Vec::new();
        let mut buffer = String::new();

        for sentence in sentences {
            // An over-limit sentence is flushed alone rather than hard-cut.
            if char_len(sentence) > self.limit {
                if !buffer.is_empty() {
                    chunks.push(std::mem::take(&mut buffer));
                }
                chunks.push(sentence.to_string());
                continue;
            }

            let prospective_len = if buffer.is_empty() {
                char_len(sentence)
            } else {
                char_len(&buffer) + 1 + char_len(sentence)
            };
            if prospective_len <= self.limit {
                if !buffer.is_empty() {
                    buffer.push(' ');
                }
                buffer.push_str(sentence);
            } else {
                if !buffer.is_empty() {
                    chunks.push(std::mem::take(&mut buffer));
                }
                buffer.push_str(sentence);
            }
        }

        if !buffer.is_empty() {
            chunks.push(buffer);
        }

        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
