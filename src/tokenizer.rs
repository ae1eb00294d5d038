//! Script-aware tokenization of page text.
//!
//! Tokens are maximal runs of characters that are neither whitespace nor a
//! boundary character. Letters, digits, combining marks and symbols all stay
//! inside a token, so a run such as `XYZكتاب123` is a single token.

use crate::config::{NormalizationConfig, TokenizerConfig};
use crate::error::{OcrRateError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

lazy_static! {
    // Whitespace and any Unicode punctuation separate tokens
    static ref DEFAULT_TOKEN_PATTERN: Regex = Regex::new(r"[^\s\p{P}]+").unwrap();
}

const TATWEEL: char = '\u{0640}';

fn is_bidi_mark(c: char) -> bool {
    matches!(
        c,
        '\u{061C}' | '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

fn is_joiner(c: char) -> bool {
    matches!(c, '\u{200C}' | '\u{200D}')
}

/// One unit of page text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Surface form after normalization (may be empty)
    pub text: String,
    /// Position within the page, starting at 0
    pub index: usize,
}

/// Splits page text into ordered tokens
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
    normalization: NormalizationConfig,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TOKEN_PATTERN.clone(),
            normalization: NormalizationConfig::default(),
        }
    }
}

impl Tokenizer {
    /// Build a tokenizer from its configuration section
    pub fn new(config: &TokenizerConfig) -> Result<Self> {
        let pattern = match &config.boundary_chars {
            None => DEFAULT_TOKEN_PATTERN.clone(),
            Some(chars) => {
                let class = format!(r"[^\s{}]+", regex::escape(chars));
                Regex::new(&class).map_err(|e| {
                    OcrRateError::Config(format!("bad tokenizer.boundary_chars: {}", e))
                })?
            }
        };
        Ok(Self {
            pattern,
            normalization: config.normalization.clone(),
        })
    }

    /// Split page text into tokens. Same input, same output.
    pub fn tokenize(&self, page_text: &str) -> Vec<Token> {
        self.pattern
            .find_iter(page_text)
            .enumerate()
            .map(|(index, m)| Token {
                text: self.normalize(m.as_str()),
                index,
            })
            .collect()
    }

    /// Tokenize raw page bytes, which must be valid UTF-8
    pub fn tokenize_bytes(&self, page_id: &str, bytes: &[u8]) -> Result<Vec<Token>> {
        let text = std::str::from_utf8(bytes).map_err(|e| OcrRateError::Tokenization {
            page_id: page_id.to_string(),
            reason: format!("invalid UTF-8 after byte {}", e.valid_up_to()),
        })?;
        Ok(self.tokenize(text))
    }

    /// Apply the configured normalization to a single token
    pub fn normalize(&self, token: &str) -> String {
        let norm = &self.normalization;
        let mut out: String = token
            .chars()
            .filter(|&c| !(norm.strip_bidi_marks && is_bidi_mark(c)))
            .filter(|&c| !(norm.strip_joiners && is_joiner(c)))
            .filter(|&c| !(norm.strip_tatweel && c == TATWEEL))
            .collect();
        if norm.strip_diacritics {
            out = out.nfd().filter(|&c| !is_combining_mark(c)).collect();
        }
        if norm.nfc {
            out = out.nfc().collect();
        }
        out
    }
}
