//! OpenITI mARkdown layout: metadata header, milestones and page markers.
//!
//! A page marker such as `PageV01P012` closes the page whose text precedes
//! it, so the marker names that page.

use crate::engine::{BookInput, PageInput};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PAGE_MARKER: Regex = Regex::new(r"PageV\d+P\d+").unwrap();
    static ref MILESTONE: Regex = Regex::new(r"\bms\d+\b").unwrap();
}

/// Line that ends the metadata block of an OpenITI text
pub const HEADER_END: &str = "#META#Header#End";

/// Page id for text following the last page marker
pub const TAIL_PAGE_ID: &str = "tail";

/// Drop everything up to and including the metadata header
pub fn strip_metadata_header(text: &str) -> &str {
    match text.rfind(HEADER_END) {
        Some(pos) => &text[pos + HEADER_END.len()..],
        None => text,
    }
}

/// Split book text into pages named after their closing markers.
///
/// Text after the last marker becomes a page named [`TAIL_PAGE_ID`] unless it
/// is blank. Milestone markers (`ms0042`) are removed from the page text.
pub fn split_pages(text: &str) -> Vec<PageInput> {
    let mut pages = Vec::new();
    let mut start = 0;
    for marker in PAGE_MARKER.find_iter(text) {
        let body = &text[start..marker.start()];
        pages.push(PageInput::new(marker.as_str(), strip_milestones(body)));
        start = marker.end();
    }
    let tail = &text[start..];
    if !tail.trim().is_empty() {
        pages.push(PageInput::new(TAIL_PAGE_ID, strip_milestones(tail)));
    }
    pages
}

fn strip_milestones(text: &str) -> String {
    MILESTONE.replace_all(text, " ").into_owned()
}

/// Build a book from the full text of an OpenITI file
pub fn book_from_openiti(
    book_id: impl Into<String>,
    source_collection: impl Into<String>,
    genre: Option<String>,
    text: &str,
) -> BookInput {
    BookInput {
        book_id: book_id.into(),
        source_collection: source_collection.into(),
        genre,
        pages: split_pages(strip_metadata_header(text)),
    }
}
