use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use super::{SegmentToken, Segmenter};
use crate::config::TokenizerConfig;
use crate::Result;

/// Unicode word tokenizer with optional stemming and stopword removal
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let stemmer = if config.stem {
            Some(Stemmer::create(Algorithm::English))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(LANGUAGE::English)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    /// Tokenize text into terms, dropping positions
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenize_with_positions(text)
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    /// Tokenize and return tokens with their word positions, in order.
    ///
    /// Positions count every word, including the ones filtered out by
    /// length or stopword rules.
    pub fn tokenize_with_positions(&self, text: &str) -> Vec<SegmentToken> {
        let mut results = Vec::new();

        for (pos, word) in text.unicode_words().enumerate() {
            let mut token = if self.config.lowercase {
                word.to_lowercase()
            } else {
                word.to_string()
            };

            let len = token.chars().count();
            if len < self.config.min_token_length || len > self.config.max_token_length {
                continue;
            }

            if self.stopwords.contains(&token) {
                continue;
            }

            if let Some(stemmer) = &self.stemmer {
                token = stemmer.stem(&token).to_string();
            }

            results.push(SegmentToken::new(token, pos as u32));
        }

        results
    }
}

impl Segmenter for Tokenizer {
    fn segment(&self, text: &str) -> Result<Vec<SegmentToken>> {
        Ok(self.tokenize_with_positions(text))
    }
}
