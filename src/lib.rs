//! OCR error-rate estimation with a spell-checking dictionary.
//!
//! Every token of every page is checked against a dictionary; tokens the
//! dictionary does not recognize are counted as likely OCR errors. Counts are
//! rolled up per page, per book and per source collection (and genre), and
//! written out as one JSON file per book plus a corpus table in JSON and TSV.
//!
//! ```no_run
//! use rust_ocr_rates::{AnalysisConfig, CorpusRunner, Engine, HunspellOracle, book_from_openiti};
//! use std::sync::Arc;
//!
//! let config = AnalysisConfig::load("ocr_rates.toml".as_ref()).unwrap();
//! let oracle = HunspellOracle::load(&config.dictionary).unwrap();
//! let engine = Engine::new(Arc::new(oracle), &config).unwrap();
//!
//! let text = std::fs::read_to_string("0255Jahiz.Hayawan.Shamela0023775-ara1").unwrap();
//! let book = book_from_openiti("0255Jahiz.Hayawan.Shamela0023775-ara1", "shamela", None, &text);
//! let report = CorpusRunner::new(&engine, &config).run(vec![book]).unwrap();
//! println!("corpus error rate: {}", report.summary.corpus_error_rate);
//! ```

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod openiti;
pub mod persist;
pub mod records;
pub mod run;
pub mod tokenizer;

#[cfg(feature = "python")]
mod python;

pub use aggregate::{PageAggregator, aggregate_book, aggregate_corpus, aggregate_page};
pub use classifier::{TokenClass, TokenClassifier, TokenVerdict};
pub use config::AnalysisConfig;
pub use dictionary::{HunspellOracle, RecognitionOracle, WordListOracle};
pub use engine::{BookInput, BookOutcome, Engine, PageContent, PageInput};
pub use error::{OcrRateError, Result};
pub use openiti::book_from_openiti;
pub use persist::{read_book_record, write_book_record, write_corpus_summary};
pub use records::{BookRecord, CorpusSummary, GroupSummary, GroupingKey, PageRecord};
pub use run::{CorpusRunner, RunError, RunReport};
pub use tokenizer::{Token, Tokenizer};
