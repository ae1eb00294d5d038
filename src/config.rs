//! Analysis configuration, loadable from TOML.
//!
//! Every section falls back to its defaults, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! [dictionary]
//! dir = "dictionaries"
//! languages = ["ar"]
//!
//! [classifier]
//! long_threshold = 8
//! foreign_script = "skip"
//! target_script = "Arabic"
//! ```

use crate::error::{OcrRateError, Result};
use crate::records::GroupingKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tokens longer than this many characters count as long-token errors.
pub const DEFAULT_LONG_THRESHOLD: usize = 8;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub dictionary: DictionaryConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub run: RunConfig,
}

impl AnalysisConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(text).map_err(|e| OcrRateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            OcrRateError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject combinations that cannot be honoured
    pub fn validate(&self) -> Result<()> {
        if self.classifier.foreign_script == ForeignScriptPolicy::Skip
            && self.classifier.target_script.is_none()
        {
            return Err(OcrRateError::Config(
                "foreign_script = \"skip\" requires classifier.target_script".to_string(),
            ));
        }
        if let Some(chars) = &self.tokenizer.boundary_chars {
            if chars.is_empty() {
                return Err(OcrRateError::Config(
                    "tokenizer.boundary_chars must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// How page text is cut into tokens
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenizerConfig {
    /// Characters that separate tokens in addition to whitespace.
    /// When unset, every Unicode punctuation character is a boundary.
    #[serde(default)]
    pub boundary_chars: Option<String>,

    #[serde(default)]
    pub normalization: NormalizationConfig,
}

/// Per-token normalization. Only useful when the dictionary is
/// sensitive to these marks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Remove directional formatting marks (LRM, RLM, ALM, embeddings, isolates)
    pub strip_bidi_marks: bool,
    /// Remove ZWNJ / ZWJ
    pub strip_joiners: bool,
    /// Remove the Arabic tatweel (kashida)
    pub strip_tatweel: bool,
    /// Remove combining marks (harakat, shadda, ...)
    pub strip_diacritics: bool,
    /// Recompose to NFC
    pub nfc: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            strip_bidi_marks: true,
            strip_joiners: false,
            strip_tatweel: false,
            strip_diacritics: false,
            nfc: false,
        }
    }
}

/// What to do with tokens whose script differs from the target script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignScriptPolicy {
    /// Check them against the dictionary like any other token
    #[default]
    Count,
    /// Leave them out of the statistics
    Skip,
}

/// Token classification policy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Unrecognized tokens longer than this are long-token errors
    pub long_threshold: usize,
    /// Skip tokens without a single alphabetic character (numbers, symbols)
    pub skip_non_alphabetic: bool,
    pub foreign_script: ForeignScriptPolicy,
    /// Script name as reported by whatlang, e.g. "Arabic"
    pub target_script: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            long_threshold: DEFAULT_LONG_THRESHOLD,
            skip_non_alphabetic: true,
            foreign_script: ForeignScriptPolicy::Count,
            target_script: None,
        }
    }
}

/// Where the dictionaries live and how to consult them
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Directory holding `<name>.aff` / `<name>.dic` pairs and word lists
    pub dir: PathBuf,
    /// Hunspell dictionary names, e.g. `["ar"]`
    pub languages: Vec<String>,
    /// Plain word lists (one word per line) inside `dir`
    pub wordlists: Vec<String>,
    /// Retry lookups with the lowercased token
    pub case_fold: bool,
    /// Explicit version label; derived from the file contents when unset
    pub version: Option<String>,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dictionaries"),
            languages: vec!["ar".to_string()],
            wordlists: Vec::new(),
            case_fold: true,
            version: None,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Folder receiving one `<book_id>_error_data.json` per book
    pub book_dir: PathBuf,
    /// Nested corpus summary
    pub summary_json: PathBuf,
    /// Flat tab-separated corpus table
    pub summary_tsv: PathBuf,
    /// Re-analyse books even when a per-book file already exists
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            book_dir: PathBuf::from("error_data"),
            summary_json: PathBuf::from("corpus_error_data.json"),
            summary_tsv: PathBuf::from("corpus_error_data.tsv"),
            overwrite: false,
        }
    }
}

/// Run-wide settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Worker threads for book-level parallelism (0 = one per core)
    pub threads: usize,
    /// Only analyse books whose id contains `-<lang_code>`
    pub lang_code: Option<String>,
    /// Key for the grouped rollup
    pub grouping: GroupingKey,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            lang_code: Some("ara".to_string()),
            grouping: GroupingKey::SourceCollection,
        }
    }
}
