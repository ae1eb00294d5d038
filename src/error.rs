//! Error types for the error-rate engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading dictionaries, analysing books or persisting results.
#[derive(Error, Debug)]
pub enum OcrRateError {
    /// A dictionary resource is missing or unusable. Fatal for the whole run.
    #[error("failed to load dictionary '{name}': {reason}")]
    DictionaryLoad {
        /// Dictionary (or word list) name as configured
        name: String,
        /// What went wrong
        reason: String,
    },

    /// A book without any pages. Reported, then excluded from the rollup.
    #[error("book '{book_id}' has no pages")]
    EmptyBook {
        /// The offending book
        book_id: String,
    },

    /// Page text that cannot be tokenized. The page is kept with zero tokens.
    #[error("cannot tokenize page '{page_id}': {reason}")]
    Tokenization {
        /// The offending page
        page_id: String,
        /// What went wrong
        reason: String,
    },

    /// Writing an output file failed, even after a retry.
    #[error("failed to write {}: {source}", path.display())]
    PersistenceWrite {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading a previously written output file failed.
    #[error("failed to read {}: {reason}", path.display())]
    PersistenceRead {
        /// Source path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Serializing a record failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl OcrRateError {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OcrRateError::DictionaryLoad { .. } | OcrRateError::Config(_)
        )
    }
}

impl From<serde_json::Error> for OcrRateError {
    fn from(err: serde_json::Error) -> Self {
        OcrRateError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for OcrRateError {
    fn from(err: csv::Error) -> Self {
        OcrRateError::Serialization(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, OcrRateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let load = OcrRateError::DictionaryLoad {
            name: "ar".into(),
            reason: "missing".into(),
        };
        assert!(load.is_fatal());
        assert!(!OcrRateError::EmptyBook { book_id: "b".into() }.is_fatal());
        assert_eq!(load.to_string(), "failed to load dictionary 'ar': missing");
    }
}
