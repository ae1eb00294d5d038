//! Python bindings (enabled with the `python` feature).

use crate::config::AnalysisConfig;
use crate::dictionary::HunspellOracle;
use crate::engine::Engine;
use crate::error::OcrRateError;
use crate::openiti::book_from_openiti;
use crate::tokenizer::Tokenizer;
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

impl From<OcrRateError> for PyErr {
    fn from(err: OcrRateError) -> PyErr {
        match err {
            OcrRateError::PersistenceWrite { .. } | OcrRateError::PersistenceRead { .. } => {
                PyIOError::new_err(err.to_string())
            }
            OcrRateError::Config(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Spell-check based error-rate engine with its dictionaries loaded
#[pyclass(name = "ErrorRateEngine")]
struct PyEngine {
    engine: Engine,
}

#[pymethods]
impl PyEngine {
    #[new]
    #[pyo3(signature = (dict_dir, languages=None, long_threshold=8, config_path=None))]
    fn new(
        dict_dir: String,
        languages: Option<Vec<String>>,
        long_threshold: usize,
        config_path: Option<String>,
    ) -> PyResult<Self> {
        let mut config = match config_path {
            Some(path) => AnalysisConfig::load(&PathBuf::from(path))?,
            None => AnalysisConfig::default(),
        };
        config.dictionary.dir = PathBuf::from(dict_dir);
        if let Some(languages) = languages {
            config.dictionary.languages = languages;
        }
        config.classifier.long_threshold = long_threshold;

        let oracle = HunspellOracle::load(&config.dictionary)?;
        let engine = Engine::new(Arc::new(oracle), &config)?;
        Ok(Self { engine })
    }

    /// Check whether the dictionaries recognize a token
    fn is_recognized(&self, token: &str) -> bool {
        self.engine.oracle().is_recognized(token)
    }

    #[getter]
    fn dictionary_version(&self) -> String {
        self.engine.dictionary_version().to_string()
    }

    /// Returns: (token_count, error_count, long_token_error_count, error_rate)
    fn page_error_rate(&self, page_id: &str, text: &str) -> (u64, u64, u64, f64) {
        let page = self.engine.analyze_page(page_id, text);
        (
            page.token_count,
            page.error_count,
            page.long_token_error_count,
            page.error_rate,
        )
    }

    /// Analyse the full text of an OpenITI book; returns the book record as JSON
    #[pyo3(signature = (book_id, text, collection, genre=None))]
    fn book_error_rates_json(
        &self,
        book_id: &str,
        text: &str,
        collection: &str,
        genre: Option<String>,
    ) -> PyResult<String> {
        let book = book_from_openiti(book_id, collection, genre, text);
        let record = self.engine.analyze_book(&book)?;
        serde_json::to_string(&record).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }
}

/// Split text into tokens with the default tokenizer
#[pyfunction]
fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::default()
        .tokenize(text)
        .into_iter()
        .map(|t| t.text)
        .collect()
}

#[pymodule]
fn rust_ocr_rates(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(tokenize, m)?)?;
    m.add_class::<PyEngine>()?;
    Ok(())
}
