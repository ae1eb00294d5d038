//! Token classification: which tokens count, and which counted tokens are errors.

use crate::config::{ClassifierConfig, ForeignScriptPolicy};
use crate::dictionary::RecognitionOracle;
use serde::{Deserialize, Serialize};

/// Outcome of classifying one token. Every token gets exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    /// Not counted at all (empty, numeric, symbols, foreign script)
    Skip,
    Recognized,
    UnrecognizedShort,
    UnrecognizedLong,
}

impl TokenClass {
    pub fn is_counted(self) -> bool {
        self != TokenClass::Skip
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            TokenClass::UnrecognizedShort | TokenClass::UnrecognizedLong
        )
    }
}

/// Full verdict for a counted token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenVerdict {
    pub token: String,
    pub recognized: bool,
    /// Length in characters
    pub length: usize,
    pub is_long: bool,
}

/// Applies the classification policy
#[derive(Debug, Clone)]
pub struct TokenClassifier {
    long_threshold: usize,
    skip_non_alphabetic: bool,
    foreign_script: ForeignScriptPolicy,
    target_script: Option<String>,
}

impl Default for TokenClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl TokenClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            long_threshold: config.long_threshold,
            skip_non_alphabetic: config.skip_non_alphabetic,
            foreign_script: config.foreign_script,
            target_script: config.target_script.clone(),
        }
    }

    pub fn long_threshold(&self) -> usize {
        self.long_threshold
    }

    /// Classify a (normalized) token
    pub fn classify(&self, token: &str, oracle: &dyn RecognitionOracle) -> TokenClass {
        let Some(length) = self.counted_length(token) else {
            return TokenClass::Skip;
        };
        if oracle.is_recognized(token) {
            TokenClass::Recognized
        } else if length > self.long_threshold {
            TokenClass::UnrecognizedLong
        } else {
            TokenClass::UnrecognizedShort
        }
    }

    /// Verdict for a counted token, `None` when the token is skipped
    pub fn verdict(&self, token: &str, oracle: &dyn RecognitionOracle) -> Option<TokenVerdict> {
        let length = self.counted_length(token)?;
        Some(TokenVerdict {
            token: token.to_string(),
            recognized: oracle.is_recognized(token),
            length,
            is_long: length > self.long_threshold,
        })
    }

    /// Character length of a token that counts toward the statistics
    fn counted_length(&self, token: &str) -> Option<usize> {
        let length = token.chars().count();
        if length == 0 {
            return None;
        }
        if self.skip_non_alphabetic && !token.chars().any(char::is_alphabetic) {
            return None;
        }
        if self.is_foreign(token) {
            return None;
        }
        Some(length)
    }

    fn is_foreign(&self, token: &str) -> bool {
        if self.foreign_script != ForeignScriptPolicy::Skip {
            return false;
        }
        let Some(target) = &self.target_script else {
            return false;
        };
        match whatlang::detect_script(token) {
            Some(script) => !script.name().eq_ignore_ascii_case(target),
            None => false,
        }
    }
}
