//! Page, book and corpus statistics.
//!
//! Field names are part of the persisted schema and must stay stable.

use serde::{Deserialize, Serialize};

/// `numerator / denominator`, or 0 when there is nothing to divide by
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Statistics of one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_id: String,
    pub token_count: u64,
    pub error_count: u64,
    pub long_token_error_count: u64,
    pub error_rate: f64,
    /// Page text could not be tokenized; counts are zero
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub malformed: bool,
}

impl PageRecord {
    /// Zero-count record for a page whose text could not be read
    pub fn malformed(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            token_count: 0,
            error_count: 0,
            long_token_error_count: 0,
            error_rate: 0.0,
            malformed: true,
        }
    }
}

/// Statistics of one book, with its pages in reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub book_id: String,
    pub source_collection: String,
    pub genre: Option<String>,
    pub pages: Vec<PageRecord>,
    pub token_count_total: u64,
    pub error_count_total: u64,
    pub long_token_error_count_total: u64,
    pub error_rate_total: f64,
    /// Long-token errors as a share of all errors
    pub long_token_error_share: f64,
    /// Long-token errors as a share of all tokens
    pub long_token_error_rate: f64,
    #[serde(default)]
    pub malformed_pages: u64,
}

impl BookRecord {
    /// Flat projection without the pages
    pub fn row(&self) -> BookRow {
        BookRow {
            book_id: self.book_id.clone(),
            source_collection: self.source_collection.clone(),
            genre: self.genre.clone(),
            pages: self.pages.len() as u64,
            token_count: self.token_count_total,
            error_count: self.error_count_total,
            long_token_error_count: self.long_token_error_count_total,
            error_rate: self.error_rate_total,
            long_token_error_share: self.long_token_error_share,
            long_token_error_rate: self.long_token_error_rate,
        }
    }
}

/// One book in the corpus table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRow {
    pub book_id: String,
    pub source_collection: String,
    pub genre: Option<String>,
    pub pages: u64,
    pub token_count: u64,
    pub error_count: u64,
    pub long_token_error_count: u64,
    pub error_rate: f64,
    pub long_token_error_share: f64,
    #[serde(default)]
    pub long_token_error_rate: f64,
}

/// Totals for a group of books (a collection, a genre)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub books: u64,
    pub token_count: u64,
    pub error_count: u64,
    pub long_token_error_count: u64,
    pub error_rate: f64,
    /// Long-token errors as a share of all errors
    pub long_token_error_share: f64,
    /// Long-token errors as a share of all tokens
    #[serde(default)]
    pub long_token_error_rate: f64,
}

/// Which book attribute the grouped rollup uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingKey {
    #[default]
    SourceCollection,
    Genre,
}

/// Why a book is missing from the rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// The book had no pages
    Empty,
    /// Analysis of the book failed
    Failed,
}

/// A book left out of the rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedBook {
    pub book_id: String,
    pub source_collection: String,
    pub kind: SkipKind,
    pub reason: String,
}

/// Corpus-wide statistics of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub dictionary_version: String,
    pub grouping: GroupingKey,
    pub total_books: u64,
    pub total_tokens: u64,
    pub total_errors: u64,
    pub total_long_token_errors: u64,
    pub corpus_error_rate: f64,
    pub long_token_error_share: f64,
    #[serde(default)]
    pub long_token_error_rate: f64,
    pub books: Vec<BookRow>,
    /// Groups under `grouping`, in first-seen order
    pub groups: Vec<GroupSummary>,
    /// Per source collection, in first-seen order
    pub per_collection: Vec<GroupSummary>,
    /// Per genre, in first-seen order
    pub per_genre: Vec<GroupSummary>,
    pub books_skipped: u64,
    pub skipped: Vec<SkippedBook>,
}

impl CorpusSummary {
    pub fn collection(&self, name: &str) -> Option<&GroupSummary> {
        self.per_collection.iter().find(|g| g.name == name)
    }

    pub fn genre(&self, name: &str) -> Option<&GroupSummary> {
        self.per_genre.iter().find(|g| g.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_guards_zero() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(ratio(1, 4), 0.25);
    }

    #[test]
    fn test_page_schema_is_stable() {
        let page = PageRecord {
            page_id: "PageV01P002".to_string(),
            token_count: 4,
            error_count: 1,
            long_token_error_count: 0,
            error_rate: 0.25,
            malformed: false,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "page_id": "PageV01P002",
                "token_count": 4,
                "error_count": 1,
                "long_token_error_count": 0,
                "error_rate": 0.25
            })
        );
        let back: PageRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, page);

        let flagged = serde_json::to_value(PageRecord::malformed("p")).unwrap();
        assert_eq!(flagged["malformed"], serde_json::json!(true));
    }
}
