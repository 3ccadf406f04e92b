//! Okapi BM25 scoring over pre-tokenized documents.
//!
//! IDF uses the smoothed form `ln((N - df + 0.5) / (df + 0.5) + 1)`, which
//! is never negative, so no epsilon floor is needed. Stats are rebuilt
//! from token lists, which is exactly what the persisted payload stores.

use std::collections::HashMap;

const K1: f32 = 1.5;
const B: f32 = 0.75;

pub struct Bm25 {
    /// term -> [(doc_index, term frequency)]
    postings: HashMap<String, Vec<(usize, u32)>>,
    idf: HashMap<String, f32>,
    doc_lens: Vec<u32>,
    avgdl: f32,
}

impl Bm25 {
    pub fn new(tokenized_docs: &[Vec<String>]) -> Self {
        let n_docs = tokenized_docs.len();
        let doc_lens: Vec<u32> = tokenized_docs.iter().map(|d| d.len() as u32).collect();
        let total_len: u64 = doc_lens.iter().map(|&l| u64::from(l)).sum();
        let avgdl = if n_docs == 0 { 0.0 } else { (total_len as f32 / n_docs as f32).max(1.0) };

        let mut postings: HashMap<String, Vec<(usize, u32)>> = HashMap::new();
        for (doc_idx, tokens) in tokenized_docs.iter().enumerate() {
            let mut tf: HashMap<&str, u32> = HashMap::new();
            for token in tokens {
                *tf.entry(token.as_str()).or_insert(0) += 1;
            }
            for (term, count) in tf {
                postings.entry(term.to_string()).or_default().push((doc_idx, count));
            }
        }

        let n = n_docs as f32;
        let idf = postings
            .iter()
            .map(|(term, posting)| {
                let df = posting.len() as f32;
                (term.clone(), ((n - df + 0.5) / (df + 0.5) + 1.0).ln())
            })
            .collect();

        Self { postings, idf, doc_lens, avgdl }
    }

    pub fn len(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lens.is_empty()
    }

    /// BM25 score of every indexed document against the query tokens.
    pub fn scores(&self, query_tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_lens.len()];
        if self.avgdl == 0.0 {
            return scores;
        }
        for term in query_tokens {
            let Some(posting) = self.postings.get(term.as_str()) else { continue };
            let idf = self.idf.get(term.as_str()).copied().unwrap_or(0.0);
            for &(doc_idx, tf) in posting {
                let tf = tf as f32;
                let dl = self.doc_lens[doc_idx] as f32;
                let denom = tf + K1 * (1.0 - B + B * dl / self.avgdl);
                scores[doc_idx] += idf * tf * (K1 + 1.0) / denom;
            }
        }
        scores
    }
}
