//! Word-pattern tokenizer for the sparse index.
//!
//! The primary pattern captures alphabetic runs; when a text produces no
//! primary tokens (e.g. non-alphabetic scripts) the broader word-character
//! pattern is used instead, so such segments stay retrievable.

use anyhow::Result;
use regex::Regex;

pub const DEFAULT_TOKEN_PATTERN: &str = "[a-zA-Z]{2,}";
const FALLBACK_TOKEN_PATTERN: &str = r"\w{2,}";

pub struct Tokenizer {
    pattern: String,
    primary: Regex,
    fallback: Regex,
}

impl Tokenizer {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: pattern.to_string(),
            primary: Regex::new(pattern)?,
            fallback: Regex::new(FALLBACK_TOKEN_PATTERN)?,
        })
    }

    /// The primary pattern string, as persisted in the index payload.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<String> = self
            .primary
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect();
        if !tokens.is_empty() {
            return tokens;
        }
        self.fallback
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl Default for Tokenizer {
    #[allow(clippy::unwrap_used)] // default pattern is a compile-time constant
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_PATTERN).unwrap()
    }
}
