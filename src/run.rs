//! A complete corpus run: filter, analyse (or reuse), persist, summarize.

use crate::config::{AnalysisConfig, OutputConfig};
use crate::engine::{BookInput, BookOutcome, Engine};
use crate::error::OcrRateError;
use crate::persist::{book_file_path, read_book_record, write_book_record, write_corpus_summary};
use crate::records::{BookRecord, CorpusSummary};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: CorpusSummary,
    /// Per-book files written during this run
    pub book_files: Vec<PathBuf>,
    /// Books taken from existing per-book files
    pub reused: usize,
    /// Books dropped by the language filter
    pub filtered_out: usize,
    /// Per-book files that could not be written
    pub write_failures: Vec<String>,
}

/// A run that had to stop. `partial` holds whatever was computed.
#[derive(Error, Debug)]
#[error("corpus run halted: {source}")]
pub struct RunError {
    pub partial: Option<Box<RunReport>>,
    #[source]
    pub source: OcrRateError,
}

impl From<OcrRateError> for RunError {
    fn from(source: OcrRateError) -> Self {
        RunError {
            partial: None,
            source,
        }
    }
}

/// Drives an [`Engine`] over a corpus and persists the results
pub struct CorpusRunner<'a> {
    engine: &'a Engine,
    output: OutputConfig,
    lang_code: Option<String>,
}

impl<'a> CorpusRunner<'a> {
    pub fn new(engine: &'a Engine, config: &AnalysisConfig) -> Self {
        Self {
            engine,
            output: config.output.clone(),
            lang_code: config.run.lang_code.clone(),
        }
    }

    fn wanted(&self, book: &BookInput) -> bool {
        match &self.lang_code {
            Some(code) => book.book_id.contains(&format!("-{}", code)),
            None => true,
        }
    }

    /// Earlier result for this book, if it may be reused
    fn cached(&self, book: &BookInput) -> Option<BookRecord> {
        if self.output.overwrite {
            return None;
        }
        let path = book_file_path(&self.output.book_dir, &book.book_id);
        if !path.exists() {
            return None;
        }
        match read_book_record(&path) {
            Ok(file) if file.record.book_id != book.book_id => {
                warn!(
                    book = %book.book_id,
                    cached = %file.record.book_id,
                    path = %path.display(),
                    "result file belongs to another book, re-analysing"
                );
                None
            }
            Ok(file) if file.dictionary_version != self.engine.dictionary_version() => {
                info!(
                    book = %book.book_id,
                    cached = %file.dictionary_version,
                    "dictionary version changed, re-analysing"
                );
                None
            }
            Ok(file)
                if file.record.source_collection != book.source_collection
                    || file.record.genre != book.genre =>
            {
                info!(
                    book = %book.book_id,
                    collection = %book.source_collection,
                    "collection or genre changed, re-analysing"
                );
                None
            }
            Ok(file) => Some(file.record),
            Err(e) => {
                warn!("{}; re-analysing", e);
                None
            }
        }
    }

    /// Run over all books, in the order given
    pub fn run<I>(&self, books: I) -> Result<RunReport, RunError>
    where
        I: IntoIterator<Item = BookInput>,
    {
        let mut filtered_out = 0;
        let mut slots: Vec<Option<BookOutcome>> = Vec::new();
        let mut pending: Vec<(usize, BookInput)> = Vec::new();
        for book in books {
            if !self.wanted(&book) {
                filtered_out += 1;
                continue;
            }
            match self.cached(&book) {
                Some(record) => slots.push(Some(BookOutcome::Analyzed(record))),
                None => {
                    pending.push((slots.len(), book));
                    slots.push(None);
                }
            }
        }
        let reused = slots.len() - pending.len();
        info!(
            books = slots.len(),
            reused,
            filtered_out,
            "starting corpus run"
        );

        let (positions, inputs): (Vec<usize>, Vec<BookInput>) = pending.into_iter().unzip();
        let outcomes = self.engine.analyze_books(&inputs)?;

        let mut book_files = Vec::new();
        let mut write_failures = Vec::new();
        for (slot, outcome) in positions.into_iter().zip(outcomes) {
            if let BookOutcome::Analyzed(record) = &outcome {
                match write_book_record(
                    &self.output.book_dir,
                    record,
                    self.engine.dictionary_version(),
                ) {
                    Ok(path) => book_files.push(path),
                    Err(e) => {
                        warn!("{}", e);
                        write_failures.push(e.to_string());
                    }
                }
            }
            slots[slot] = Some(outcome);
        }

        let summary = self.engine.summarize(slots.into_iter().flatten().collect());
        let report = RunReport {
            summary,
            book_files,
            reused,
            filtered_out,
            write_failures,
        };

        if let Err(source) = write_corpus_summary(
            &self.output.summary_json,
            &self.output.summary_tsv,
            &report.summary,
        ) {
            return Err(RunError {
                partial: Some(Box::new(report)),
                source,
            });
        }
        Ok(report)
    }
}
