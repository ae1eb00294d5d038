//! End-to-end scenarios: text in, persisted statistics out.

use rust_ocr_rates::*;
use std::fs;
use std::sync::Arc;

fn engine(words: &[&str]) -> Engine {
    Engine::with_defaults(Arc::new(WordListOracle::new(words.iter().copied(), "test-dict-1")))
}

#[test]
fn test_mixed_token_page() {
    let record = engine(&["كتاب"]).analyze_page("PageV01P001", "كتاب XYZكتاب123");

    // "XYZكتاب123" is 10 characters, over the long-token threshold
    assert_eq!(record.token_count, 2);
    assert_eq!(record.error_count, 1);
    assert_eq!(record.long_token_error_count, 1);
    assert_eq!(record.error_rate, 0.5);
}

#[test]
fn test_empty_page() {
    let record = engine(&["كتاب"]).analyze_page("PageV01P001", "");
    assert_eq!(record.token_count, 0);
    assert_eq!(record.error_count, 0);
    assert_eq!(record.error_rate, 0.0);
}

#[test]
fn test_same_input_same_records() {
    let engine = engine(&["قال", "كتاب"]);
    let text = "قال المؤلف: هذا كتاب في ١٢ بابا، XYZ";
    let a = engine.analyze_page("PageV01P001", text);
    let b = engine.analyze_page("PageV01P001", text);
    assert_eq!(a, b);
    assert_eq!(a.error_rate.to_bits(), b.error_rate.to_bits());
}

fn page_with(recognized: usize, errors: usize) -> String {
    let mut words = vec!["قال"; recognized];
    words.extend(std::iter::repeat("خطا").take(errors));
    words.join(" ")
}

#[test]
fn test_collection_rate_is_token_weighted() {
    let engine = engine(&["قال"]);
    let books = vec![
        BookInput::new("A", "shamela").with_page(PageInput::new("PageV01P001", page_with(95, 5))),
        BookInput::new("B", "shamela").with_page(PageInput::new("PageV01P001", page_with(5, 5))),
    ];
    let summary = engine.analyze_corpus(&books).unwrap();

    let group = summary.collection("shamela").unwrap();
    assert_eq!(group.token_count, 110);
    assert_eq!(group.error_count, 10);
    assert_eq!(group.error_rate, 10.0 / 110.0);
    assert_ne!(group.error_rate, (0.05 + 0.5) / 2.0);
    assert_eq!(summary.corpus_error_rate, 10.0 / 110.0);
}

#[test]
fn test_small_and_large_books() {
    let engine = engine(&["قال"]);
    let books = vec![
        BookInput::new("small", "a").with_page(PageInput::new("p", page_with(5, 5))),
        BookInput::new("large", "b").with_page(PageInput::new("p", page_with(990, 10))),
    ];
    let summary = engine.analyze_corpus(&books).unwrap();

    let rates: Vec<f64> = summary.books.iter().map(|b| b.error_rate).collect();
    let mean = rates.iter().sum::<f64>() / rates.len() as f64;
    assert_eq!(summary.total_tokens, 1010);
    assert_eq!(summary.corpus_error_rate, 15.0 / 1010.0);
    assert!((summary.corpus_error_rate - mean).abs() > 0.1);
}

#[test]
fn test_openiti_book_to_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AnalysisConfig::default();
    config.output.book_dir = dir.path().join("error_data");
    config.output.summary_json = dir.path().join("corpus_error_data.json");
    config.output.summary_tsv = dir.path().join("corpus_error_data.tsv");

    let text = "######OpenITI#\n#META# 010.AuthorNAME :: x\n#META#Header#End#\n\
                # قال كتاب PageV01P001 # كتاب ms0001 XYZكتاب123 PageV01P002\n";
    let book = book_from_openiti(
        "0255Jahiz.Hayawan.Shamela0023775-ara1",
        "shamela",
        Some("adab".to_string()),
        text,
    );
    let engine = engine(&["قال", "كتاب"]);
    let report = CorpusRunner::new(&engine, &config).run(vec![book]).unwrap();

    let file = read_book_record(&report.book_files[0]).unwrap();
    assert_eq!(file.dictionary_version, "test-dict-1");
    let pages: Vec<(&str, u64, u64)> = file
        .record
        .pages
        .iter()
        .map(|p| (p.page_id.as_str(), p.token_count, p.error_count))
        .collect();
    assert_eq!(pages, vec![("PageV01P001", 2, 0), ("PageV01P002", 2, 1)]);
    assert_eq!(file.record.long_token_error_count_total, 1);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config.output.summary_json).unwrap()).unwrap();
    assert_eq!(summary["total_tokens"], 4);
    assert_eq!(summary["per_genre"][0]["name"], "adab");

    let tsv = fs::read_to_string(&config.output.summary_tsv).unwrap();
    assert!(tsv.lines().any(|l| l.starts_with("total\t")));
    assert!(tsv.lines().any(|l| l.starts_with("collection\tshamela\t")));
}

#[test]
fn test_empty_book_appears_as_skipped() {
    let engine = engine(&["قال"]);
    let books = vec![
        BookInput::new("full", "a").with_page(PageInput::new("p", "قال")),
        BookInput::new("empty", "a"),
    ];
    let summary = engine.analyze_corpus(&books).unwrap();
    assert_eq!(summary.total_books, 1);
    assert_eq!(summary.books_skipped, 1);
    assert_eq!(summary.skipped[0].book_id, "empty");
}
