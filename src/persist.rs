//! Writing and reading result files.
//!
//! Every file is written to a temporary file in the destination directory and
//! renamed into place, so a reader never sees a half-written file. A failed
//! write is retried once before the error is reported.

use crate::error::{OcrRateError, Result};
use crate::records::{BookRecord, CorpusSummary, GroupSummary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Suffix of per-book result files
pub const BOOK_FILE_SUFFIX: &str = "_error_data.json";

/// Contents of a per-book result file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookFile {
    pub dictionary_version: String,
    #[serde(flatten)]
    pub record: BookRecord,
}

/// Where the result file of a book lives.
///
/// Path separators are percent-escaped (and `%` itself), so distinct book ids
/// always get distinct files inside `dir`.
pub fn book_file_path(dir: &Path, book_id: &str) -> PathBuf {
    let mut name = String::with_capacity(book_id.len());
    for c in book_id.chars() {
        match c {
            '%' => name.push_str("%25"),
            '/' => name.push_str("%2F"),
            '\\' => name.push_str("%5C"),
            _ => name.push(c),
        }
    }
    dir.join(format!("{}{}", name, BOOK_FILE_SUFFIX))
}

/// Write one book's pages and totals to `<dir>/<book_id>_error_data.json`
pub fn write_book_record(
    dir: &Path,
    record: &BookRecord,
    dictionary_version: &str,
) -> Result<PathBuf> {
    let path = book_file_path(dir, &record.book_id);
    let file = BookFile {
        dictionary_version: dictionary_version.to_string(),
        record: record.clone(),
    };
    let mut bytes = serde_json::to_vec_pretty(&file)?;
    bytes.push(b'\n');
    write_atomic(&path, &bytes)?;
    debug!(path = %path.display(), "wrote book record");
    Ok(path)
}

/// Read a per-book result file written by [`write_book_record`]
pub fn read_book_record(path: &Path) -> Result<BookFile> {
    let text = fs::read_to_string(path).map_err(|e| OcrRateError::PersistenceRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| OcrRateError::PersistenceRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write the nested JSON summary and the flat tab-separated table
pub fn write_corpus_summary(
    json_path: &Path,
    tsv_path: &Path,
    summary: &CorpusSummary,
) -> Result<()> {
    let mut json = serde_json::to_vec_pretty(summary)?;
    json.push(b'\n');
    write_atomic(json_path, &json)?;
    write_atomic(tsv_path, &summary_table(summary)?)?;
    debug!(
        json = %json_path.display(),
        tsv = %tsv_path.display(),
        "wrote corpus summary"
    );
    Ok(())
}

/// One line of the flat corpus table
#[derive(Debug, Serialize)]
struct TableRow<'a> {
    level: &'static str,
    id: &'a str,
    source_collection: &'a str,
    genre: &'a str,
    token_count: Option<u64>,
    error_count: Option<u64>,
    long_token_error_count: Option<u64>,
    error_rate: Option<f64>,
    long_token_error_share: Option<f64>,
    long_token_error_rate: Option<f64>,
}

impl<'a> TableRow<'a> {
    fn group(level: &'static str, group: &'a GroupSummary) -> Self {
        TableRow {
            level,
            id: &group.name,
            source_collection: if level == "collection" { group.name.as_str() } else { "" },
            genre: if level == "genre" { group.name.as_str() } else { "" },
            token_count: Some(group.token_count),
            error_count: Some(group.error_count),
            long_token_error_count: Some(group.long_token_error_count),
            error_rate: Some(group.error_rate),
            long_token_error_share: Some(group.long_token_error_share),
            long_token_error_rate: Some(group.long_token_error_rate),
        }
    }
}

/// Render the corpus table: books, collections, genres, skipped books, total
pub fn summary_table(summary: &CorpusSummary) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());

    for book in &summary.books {
        writer.serialize(TableRow {
            level: "book",
            id: &book.book_id,
            source_collection: &book.source_collection,
            genre: book.genre.as_deref().unwrap_or(""),
            token_count: Some(book.token_count),
            error_count: Some(book.error_count),
            long_token_error_count: Some(book.long_token_error_count),
            error_rate: Some(book.error_rate),
            long_token_error_share: Some(book.long_token_error_share),
            long_token_error_rate: Some(book.long_token_error_rate),
        })?;
    }
    for group in &summary.per_collection {
        writer.serialize(TableRow::group("collection", group))?;
    }
    for group in &summary.per_genre {
        writer.serialize(TableRow::group("genre", group))?;
    }
    for skipped in &summary.skipped {
        writer.serialize(TableRow {
            level: "skipped",
            id: &skipped.book_id,
            source_collection: &skipped.source_collection,
            genre: "",
            token_count: None,
            error_count: None,
            long_token_error_count: None,
            error_rate: None,
            long_token_error_share: None,
            long_token_error_rate: None,
        })?;
    }
    writer.serialize(TableRow {
        level: "total",
        id: "total",
        source_collection: "",
        genre: "",
        token_count: Some(summary.total_tokens),
        error_count: Some(summary.total_errors),
        long_token_error_count: Some(summary.total_long_token_errors),
        error_rate: Some(summary.corpus_error_rate),
        long_token_error_share: Some(summary.long_token_error_share),
        long_token_error_rate: Some(summary.long_token_error_rate),
    })?;

    writer
        .into_inner()
        .map_err(|e| OcrRateError::Serialization(e.to_string()))
}

/// Publish `bytes` at `path` atomically, retrying once
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    match write_once(path, bytes) {
        Ok(()) => Ok(()),
        Err(first) => {
            warn!(path = %path.display(), "write failed, retrying: {}", first);
            write_once(path, bytes).map_err(|source| OcrRateError::PersistenceWrite {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn write_once(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
