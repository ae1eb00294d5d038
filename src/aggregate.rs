//! Rolling token verdicts up into page, book and corpus statistics.
//!
//! Rates are always computed from summed raw counts, once per level. Rates
//! are never averaged: a corpus rate is token-weighted, so a 10-token book
//! does not weigh as much as a 1000-token one.

use crate::classifier::TokenClass;
use crate::error::{OcrRateError, Result};
use crate::records::{
    BookRecord, CorpusSummary, GroupSummary, GroupingKey, PageRecord, SkippedBook, ratio,
};
use std::collections::HashMap;

/// Group name for books without a genre
pub const UNKNOWN_GENRE: &str = "unknown";

/// Single-pass accumulator for one page
#[derive(Debug, Clone, Copy, Default)]
pub struct PageAggregator {
    token_count: u64,
    error_count: u64,
    long_token_error_count: u64,
}

impl PageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, class: TokenClass) {
        match class {
            TokenClass::Skip => {}
            TokenClass::Recognized => self.token_count += 1,
            TokenClass::UnrecognizedShort => {
                self.token_count += 1;
                self.error_count += 1;
            }
            TokenClass::UnrecognizedLong => {
                self.token_count += 1;
                self.error_count += 1;
                self.long_token_error_count += 1;
            }
        }
    }

    /// Freeze the counts into a page record
    pub fn finish(self, page_id: impl Into<String>) -> PageRecord {
        PageRecord {
            page_id: page_id.into(),
            token_count: self.token_count,
            error_count: self.error_count,
            long_token_error_count: self.long_token_error_count,
            error_rate: ratio(self.error_count, self.token_count),
            malformed: false,
        }
    }
}

/// Fold the classified tokens of a page into its record
pub fn aggregate_page<I>(page_id: impl Into<String>, classes: I) -> PageRecord
where
    I: IntoIterator<Item = TokenClass>,
{
    let mut acc = PageAggregator::new();
    for class in classes {
        acc.push(class);
    }
    acc.finish(page_id)
}

/// Fold the pages of a book. A book without pages is an [`OcrRateError::EmptyBook`].
pub fn aggregate_book(
    book_id: impl Into<String>,
    source_collection: impl Into<String>,
    genre: Option<String>,
    pages: Vec<PageRecord>,
) -> Result<BookRecord> {
    let book_id = book_id.into();
    if pages.is_empty() {
        return Err(OcrRateError::EmptyBook { book_id });
    }

    let mut tokens = 0u64;
    let mut errors = 0u64;
    let mut long = 0u64;
    let mut malformed = 0u64;
    for page in &pages {
        tokens += page.token_count;
        errors += page.error_count;
        long += page.long_token_error_count;
        malformed += u64::from(page.malformed);
    }

    Ok(BookRecord {
        book_id,
        source_collection: source_collection.into(),
        genre,
        pages,
        token_count_total: tokens,
        error_count_total: errors,
        long_token_error_count_total: long,
        error_rate_total: ratio(errors, tokens),
        long_token_error_share: ratio(long, errors),
        long_token_error_rate: ratio(long, tokens),
        malformed_pages: malformed,
    })
}

#[derive(Debug, Default)]
struct GroupTotals {
    books: u64,
    tokens: u64,
    errors: u64,
    long: u64,
}

impl GroupTotals {
    fn add(&mut self, book: &BookRecord) {
        self.books += 1;
        self.tokens += book.token_count_total;
        self.errors += book.error_count_total;
        self.long += book.long_token_error_count_total;
    }

    fn into_summary(self, name: String) -> GroupSummary {
        GroupSummary {
            name,
            books: self.books,
            token_count: self.tokens,
            error_count: self.errors,
            long_token_error_count: self.long,
            error_rate: ratio(self.errors, self.tokens),
            long_token_error_share: ratio(self.long, self.errors),
            long_token_error_rate: ratio(self.long, self.tokens),
        }
    }
}

fn group_key(book: &BookRecord, key: GroupingKey) -> &str {
    match key {
        GroupingKey::SourceCollection => &book.source_collection,
        GroupingKey::Genre => book.genre.as_deref().unwrap_or(UNKNOWN_GENRE),
    }
}

/// Group books by `key`, keeping the order in which groups first appear
fn group_books(books: &[BookRecord], key: GroupingKey) -> Vec<GroupSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, GroupTotals)> = Vec::new();
    for book in books {
        let name = group_key(book, key);
        let slot = *index.entry(name).or_insert_with(|| {
            groups.push((name, GroupTotals::default()));
            groups.len() - 1
        });
        groups[slot].1.add(book);
    }
    groups
        .into_iter()
        .map(|(name, totals)| totals.into_summary(name.to_string()))
        .collect()
}

/// Build the corpus summary from a fixed snapshot of book records
pub fn aggregate_corpus(
    books: &[BookRecord],
    grouping: GroupingKey,
    dictionary_version: &str,
) -> CorpusSummary {
    aggregate_corpus_with_skipped(books, Vec::new(), grouping, dictionary_version)
}

/// Like [`aggregate_corpus`], recording the books that were left out
pub fn aggregate_corpus_with_skipped(
    books: &[BookRecord],
    skipped: Vec<SkippedBook>,
    grouping: GroupingKey,
    dictionary_version: &str,
) -> CorpusSummary {
    let mut totals = GroupTotals::default();
    for book in books {
        totals.add(book);
    }

    CorpusSummary {
        dictionary_version: dictionary_version.to_string(),
        grouping,
        total_books: totals.books,
        total_tokens: totals.tokens,
        total_errors: totals.errors,
        total_long_token_errors: totals.long,
        corpus_error_rate: ratio(totals.errors, totals.tokens),
        long_token_error_share: ratio(totals.long, totals.errors),
        long_token_error_rate: ratio(totals.long, totals.tokens),
        books: books.iter().map(BookRecord::row).collect(),
        groups: group_books(books, grouping),
        per_collection: group_books(books, GroupingKey::SourceCollection),
        per_genre: group_books(books, GroupingKey::Genre),
        books_skipped: skipped.len() as u64,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SkipKind;

    fn page(id: &str, tokens: u64, errors: u64, long: u64) -> PageRecord {
        PageRecord {
            page_id: id.to_string(),
            token_count: tokens,
            error_count: errors,
            long_token_error_count: long,
            error_rate: ratio(errors, tokens),
            malformed: false,
        }
    }

    fn book(id: &str, collection: &str, genre: Option<&str>, pages: Vec<PageRecord>) -> BookRecord {
        aggregate_book(id, collection, genre.map(str::to_string), pages).unwrap()
    }

    #[test]
    fn test_page_fold() {
        use TokenClass::*;
        let record = aggregate_page(
            "PageV01P001",
            [Recognized, Skip, UnrecognizedShort, UnrecognizedLong, Recognized],
        );
        assert_eq!(record.token_count, 4);
        assert_eq!(record.error_count, 2);
        assert_eq!(record.long_token_error_count, 1);
        assert_eq!(record.error_rate, 0.5);
    }

    #[test]
    fn test_empty_page_has_zero_rate() {
        let record = aggregate_page("PageV01P001", []);
        assert_eq!(record.token_count, 0);
        assert_eq!(record.error_count, 0);
        assert_eq!(record.error_rate, 0.0);

        let skipped_only = aggregate_page("p", [TokenClass::Skip, TokenClass::Skip]);
        assert_eq!(skipped_only.token_count, 0);
        assert_eq!(skipped_only.error_rate, 0.0);
    }

    #[test]
    fn test_book_sums_raw_counts() {
        let record = book(
            "b",
            "c",
            None,
            vec![page("p1", 3, 1, 0), page("p2", 7, 0, 0), page("p3", 0, 0, 0)],
        );
        assert_eq!(record.token_count_total, 10);
        assert_eq!(record.error_count_total, 1);
        // not the mean of page rates (1/3 + 0 + 0) / 3
        assert_eq!(record.error_rate_total, 0.1);
        assert_eq!(record.long_token_error_share, 0.0);
        assert_eq!(record.pages.len(), 3);
    }

    #[test]
    fn test_long_token_share_and_rate() {
        let record = book("b", "c", None, vec![page("p1", 20, 4, 1)]);
        assert_eq!(record.long_token_error_share, 0.25);
        assert_eq!(record.long_token_error_rate, 0.05);
    }

    #[test]
    fn test_empty_book_is_reported() {
        let err = aggregate_book("0300Author.Book.Shamela0001-ara1", "shamela", None, vec![])
            .unwrap_err();
        assert!(matches!(err, OcrRateError::EmptyBook { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_corpus_rate_is_token_weighted() {
        let small = book("small", "c", None, vec![page("p", 10, 5, 0)]);
        let large = book("large", "c", None, vec![page("p", 1000, 10, 0)]);
        let summary = aggregate_corpus(&[small, large], GroupingKey::SourceCollection, "v1");

        let weighted = 15.0 / 1010.0;
        let mean_of_rates = (0.5 + 0.01) / 2.0;
        assert_eq!(summary.corpus_error_rate, weighted);
        assert_ne!(summary.corpus_error_rate, mean_of_rates);
        assert_eq!(summary.collection("c").unwrap().error_rate, weighted);
    }

    #[test]
    fn test_collection_rate_from_summed_counts() {
        let a = book("A", "shamela", None, vec![page("p", 100, 5, 0)]);
        let b = book("B", "shamela", None, vec![page("p", 10, 5, 0)]);
        let summary = aggregate_corpus(&[a, b], GroupingKey::SourceCollection, "v1");

        let group = summary.collection("shamela").unwrap();
        assert_eq!(group.books, 2);
        assert_eq!(group.token_count, 110);
        assert_eq!(group.error_count, 10);
        assert_eq!(group.error_rate, 10.0 / 110.0);
        assert_ne!(group.error_rate, (0.05 + 0.5) / 2.0);
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let books = vec![
            book("1", "zaydiyya", Some("fiqh"), vec![page("p", 10, 1, 0)]),
            book("2", "albaboom", None, vec![page("p", 10, 2, 1)]),
            book("3", "zaydiyya", Some("tarikh"), vec![page("p", 10, 3, 0)]),
            book("4", "jk", Some("fiqh"), vec![page("p", 10, 4, 0)]),
        ];
        let summary = aggregate_corpus(&books, GroupingKey::Genre, "v1");

        let collections: Vec<&str> = summary.per_collection.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(collections, vec!["zaydiyya", "albaboom", "jk"]);
        let genres: Vec<&str> = summary.per_genre.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(genres, vec!["fiqh", UNKNOWN_GENRE, "tarikh"]);
        assert_eq!(summary.groups, summary.per_genre);
        assert_eq!(summary.genre("fiqh").unwrap().error_count, 5);
        assert_eq!(summary.collection("zaydiyya").unwrap().token_count, 20);
    }

    #[test]
    fn test_totals_equal_child_sums() {
        let books = vec![
            book("1", "a", None, vec![page("p1", 13, 2, 1), page("p2", 8, 8, 3)]),
            book("2", "b", None, vec![page("p1", 0, 0, 0)]),
            book("3", "a", None, vec![page("p1", 41, 0, 0)]),
        ];
        let summary = aggregate_corpus(&books, GroupingKey::SourceCollection, "v1");
        let token_sum: u64 = summary.books.iter().map(|b| b.token_count).sum();
        let error_sum: u64 = summary.per_collection.iter().map(|g| g.error_count).sum();
        assert_eq!(summary.total_tokens, token_sum);
        assert_eq!(summary.total_errors, error_sum);
        assert_eq!(summary.total_long_token_errors, 4);
        assert_eq!(summary.total_books, 3);
        assert_eq!(summary.long_token_error_rate, 4.0 / 62.0);
        assert_eq!(summary.collection("a").unwrap().long_token_error_rate, 4.0 / 62.0);
        assert_eq!(summary.collection("b").unwrap().long_token_error_rate, 0.0);
        assert_eq!(summary.books[0].long_token_error_rate, 4.0 / 21.0);
    }

    #[test]
    fn test_skipped_books_are_counted() {
        let skipped = vec![SkippedBook {
            book_id: "empty".to_string(),
            source_collection: "a".to_string(),
            kind: SkipKind::Empty,
            reason: "book 'empty' has no pages".to_string(),
        }];
        let summary =
            aggregate_corpus_with_skipped(&[], skipped, GroupingKey::SourceCollection, "v1");
        assert_eq!(summary.books_skipped, 1);
        assert_eq!(summary.total_books, 0);
        assert_eq!(summary.corpus_error_rate, 0.0);
    }
}
