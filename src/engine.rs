//! Page, book and corpus analysis on top of a shared recognition oracle.

use crate::aggregate::{PageAggregator, aggregate_book, aggregate_corpus_with_skipped};
use crate::classifier::{TokenClass, TokenClassifier};
use crate::config::AnalysisConfig;
use crate::dictionary::RecognitionOracle;
use crate::error::{OcrRateError, Result};
use crate::records::{BookRecord, CorpusSummary, GroupingKey, PageRecord, SkipKind, SkippedBook};
use crate::tokenizer::{Token, Tokenizer};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Raw page content as handed over by corpus traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    Text(String),
    /// Undecoded bytes; invalid UTF-8 makes the page malformed
    Bytes(Vec<u8>),
}

/// One page of a book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInput {
    pub id: String,
    pub content: PageContent,
}

impl PageInput {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: PageContent::Text(text.into()),
        }
    }

    pub fn from_bytes(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            content: PageContent::Bytes(bytes),
        }
    }
}

/// One book with its pages in reading order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInput {
    pub book_id: String,
    pub source_collection: String,
    pub genre: Option<String>,
    pub pages: Vec<PageInput>,
}

impl BookInput {
    pub fn new(book_id: impl Into<String>, source_collection: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            source_collection: source_collection.into(),
            genre: None,
            pages: Vec::new(),
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_page(mut self, page: PageInput) -> Self {
        self.pages.push(page);
        self
    }
}

/// What happened to one book
#[derive(Debug, Clone, PartialEq)]
pub enum BookOutcome {
    Analyzed(BookRecord),
    Skipped(SkippedBook),
}

/// Tokenizer, classifier and oracle, shared read-only by all workers
pub struct Engine {
    oracle: Arc<dyn RecognitionOracle>,
    tokenizer: Tokenizer,
    classifier: TokenClassifier,
    threads: usize,
    grouping: GroupingKey,
}

impl Engine {
    pub fn new(oracle: Arc<dyn RecognitionOracle>, config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            oracle,
            tokenizer: Tokenizer::new(&config.tokenizer)?,
            classifier: TokenClassifier::new(&config.classifier),
            threads: config.run.threads,
            grouping: config.run.grouping,
        })
    }

    /// Engine with the default policy
    pub fn with_defaults(oracle: Arc<dyn RecognitionOracle>) -> Self {
        Self {
            oracle,
            tokenizer: Tokenizer::default(),
            classifier: TokenClassifier::default(),
            threads: 0,
            grouping: GroupingKey::default(),
        }
    }

    pub fn dictionary_version(&self) -> &str {
        self.oracle.version()
    }

    pub fn oracle(&self) -> &dyn RecognitionOracle {
        self.oracle.as_ref()
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn classify(&self, token: &str) -> TokenClass {
        self.classifier.classify(token, self.oracle.as_ref())
    }

    /// Tokenize, classify and fold one page of text
    pub fn analyze_page(&self, page_id: &str, text: &str) -> PageRecord {
        self.fold_tokens(page_id, self.tokenizer.tokenize(text))
    }

    fn fold_tokens(&self, page_id: &str, tokens: Vec<Token>) -> PageRecord {
        let mut acc = PageAggregator::new();
        for token in tokens {
            acc.push(self.classify(&token.text));
        }
        acc.finish(page_id)
    }

    /// Like [`Engine::analyze_page`]; pages that cannot be tokenized are
    /// kept as zero-count records flagged `malformed`.
    pub fn analyze_page_input(&self, page: &PageInput) -> PageRecord {
        match &page.content {
            PageContent::Text(text) => self.analyze_page(&page.id, text),
            PageContent::Bytes(bytes) => match self.tokenizer.tokenize_bytes(&page.id, bytes) {
                Ok(tokens) => self.fold_tokens(&page.id, tokens),
                Err(e) => {
                    warn!("{}", e);
                    PageRecord::malformed(page.id.as_str())
                }
            },
        }
    }

    /// Analyse every page of a book, in order
    pub fn analyze_book(&self, book: &BookInput) -> Result<BookRecord> {
        let pages: Vec<PageRecord> = book
            .pages
            .iter()
            .map(|page| self.analyze_page_input(page))
            .collect();
        let record = aggregate_book(
            book.book_id.as_str(),
            book.source_collection.as_str(),
            book.genre.clone(),
            pages,
        )?;
        debug!(
            book = %record.book_id,
            tokens = record.token_count_total,
            errors = record.error_count_total,
            "analyzed book"
        );
        Ok(record)
    }

    /// Analyse one book; any failure, panics included, becomes a skipped entry
    fn analyze_isolated(&self, book: &BookInput) -> BookOutcome {
        let skipped = |kind: SkipKind, reason: String| {
            warn!(book = %book.book_id, "skipping book: {}", reason);
            BookOutcome::Skipped(SkippedBook {
                book_id: book.book_id.clone(),
                source_collection: book.source_collection.clone(),
                kind,
                reason,
            })
        };
        match panic::catch_unwind(AssertUnwindSafe(|| self.analyze_book(book))) {
            Ok(Ok(record)) => BookOutcome::Analyzed(record),
            Ok(Err(e @ OcrRateError::EmptyBook { .. })) => skipped(SkipKind::Empty, e.to_string()),
            Ok(Err(e)) => skipped(SkipKind::Failed, e.to_string()),
            Err(payload) => skipped(SkipKind::Failed, panic_message(payload.as_ref())),
        }
    }

    /// Analyse books in parallel. Outcomes keep the input order.
    pub fn analyze_books(&self, books: &[BookInput]) -> Result<Vec<BookOutcome>> {
        let run = || {
            books
                .par_iter()
                .map(|book| self.analyze_isolated(book))
                .collect::<Vec<_>>()
        };
        if self.threads == 0 {
            return Ok(run());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| OcrRateError::Config(format!("cannot start worker pool: {}", e)))?;
        Ok(pool.install(run))
    }

    /// Roll the analysed books up; skipped books are listed, not counted
    pub fn summarize(&self, outcomes: Vec<BookOutcome>) -> CorpusSummary {
        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                BookOutcome::Analyzed(record) => records.push(record),
                BookOutcome::Skipped(entry) => skipped.push(entry),
            }
        }
        let summary =
            aggregate_corpus_with_skipped(&records, skipped, self.grouping, self.dictionary_version());
        info!(
            books = summary.total_books,
            skipped = summary.books_skipped,
            tokens = summary.total_tokens,
            error_rate = summary.corpus_error_rate,
            "corpus summary built"
        );
        summary
    }

    /// Analyse all books and build the corpus summary
    pub fn analyze_corpus(&self, books: &[BookInput]) -> Result<CorpusSummary> {
        let outcomes = self.analyze_books(books)?;
        Ok(self.summarize(outcomes))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("analysis panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("analysis panicked: {}", s)
    } else {
        "analysis panicked".to_string()
    }
}
