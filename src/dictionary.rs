//! Dictionary-backed recognition oracles.
//!
//! Loads Hunspell dictionaries (and optional plain word lists) to decide
//! whether a token is a known word. A token matching ANY loaded resource is
//! recognized. Every oracle carries a version string that is written next to
//! the results, since rates are only comparable across runs that used the
//! same dictionaries.

use crate::config::DictionaryConfig;
use crate::error::{OcrRateError, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use zspell::Dictionary;

/// The "is this a word" capability consumed by the classifier.
///
/// Implementations must be deterministic for a fixed version and safe to
/// share read-only between worker threads.
pub trait RecognitionOracle: Send + Sync {
    /// Whether the dictionary knows this token
    fn is_recognized(&self, token: &str) -> bool;

    /// Identity of the loaded dictionary data
    fn version(&self) -> &str;
}

/// Hunspell dictionaries plus word lists, loaded from one directory
pub struct HunspellOracle {
    dictionaries: Vec<(String, Dictionary)>,
    words: HashSet<String>,
    case_fold: bool,
    version: String,
}

impl HunspellOracle {
    /// Load every configured dictionary. Any missing resource is fatal.
    pub fn load(config: &DictionaryConfig) -> Result<Self> {
        let dir = config.dir.as_path();
        if !dir.is_dir() {
            return Err(OcrRateError::DictionaryLoad {
                name: dir.display().to_string(),
                reason: "dictionary directory not found".to_string(),
            });
        }
        if config.languages.is_empty() && config.wordlists.is_empty() {
            return Err(OcrRateError::DictionaryLoad {
                name: dir.display().to_string(),
                reason: "no dictionaries or word lists configured".to_string(),
            });
        }

        let mut hasher = Sha256::new();
        let mut dictionaries = Vec::with_capacity(config.languages.len());
        for name in &config.languages {
            let (aff, dic) = read_hunspell_pair(dir, name)?;
            hasher.update(name.as_bytes());
            hasher.update(aff.as_bytes());
            hasher.update(dic.as_bytes());
            dictionaries.push((name.clone(), build_dict(name, &aff, &dic)?));
        }

        let mut words = HashSet::new();
        for file in &config.wordlists {
            let content = read_resource(&dir.join(file), file)?;
            hasher.update(file.as_bytes());
            hasher.update(content.as_bytes());
            let before = words.len();
            words.extend(parse_wordlist(&content));
            info!(wordlist = %file, added = words.len() - before, "loaded word list");
        }

        let mut names: Vec<&str> = config.languages.iter().map(String::as_str).collect();
        names.extend(config.wordlists.iter().map(String::as_str));
        let version = match &config.version {
            Some(v) => v.clone(),
            None => {
                let digest = hex::encode(hasher.finalize());
                format!("{}@sha256:{}", names.join("+"), &digest[..16])
            }
        };

        let oracle = Self {
            dictionaries,
            words,
            case_fold: config.case_fold,
            version,
        };
        info!("{}", oracle.stats());
        Ok(oracle)
    }

    fn check_exact(&self, word: &str) -> bool {
        if self.dictionaries.iter().any(|(_, d)| d.check_word(word)) {
            return true;
        }
        self.words.contains(word)
    }

    /// Which resources recognize a token (for debugging)
    pub fn check_languages(&self, word: &str) -> Vec<&str> {
        let lower = word.to_lowercase();
        let mut langs: Vec<&str> = self
            .dictionaries
            .iter()
            .filter(|(_, d)| d.check_word(word) || d.check_word(&lower))
            .map(|(name, _)| name.as_str())
            .collect();
        if self.words.contains(word) || self.words.contains(&lower) {
            langs.push("wordlist");
        }
        langs
    }

    /// Summary of what was loaded
    pub fn stats(&self) -> String {
        let names: Vec<&str> = self.dictionaries.iter().map(|(n, _)| n.as_str()).collect();
        format!(
            "Dictionaries loaded: [{}], wordlist entries={}, version={}",
            names.join(", "),
            self.words.len(),
            self.version
        )
    }
}

impl RecognitionOracle for HunspellOracle {
    fn is_recognized(&self, token: &str) -> bool {
        // Try exact match first
        if self.check_exact(token) {
            return true;
        }
        if !self.case_fold {
            return false;
        }
        let lower = token.to_lowercase();
        lower != token && self.check_exact(&lower)
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// In-memory word set, useful for tests and for corpora with a plain word list
#[derive(Debug, Clone)]
pub struct WordListOracle {
    words: HashSet<String>,
    version: String,
}

impl WordListOracle {
    pub fn new<I, S>(words: I, version: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            version: version.into(),
        }
    }

    /// Load a word list file; the version defaults to a digest of its content
    pub fn load(path: &Path, version: Option<String>) -> Result<Self> {
        let name = path.display().to_string();
        let content = read_resource(path, &name)?;
        let version = version.unwrap_or_else(|| {
            let digest = hex::encode(Sha256::digest(content.as_bytes()));
            format!("wordlist@sha256:{}", &digest[..16])
        });
        Ok(Self {
            words: parse_wordlist(&content).collect(),
            version,
        })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl RecognitionOracle for WordListOracle {
    fn is_recognized(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// One word per line, `#` starts a comment line
fn parse_wordlist(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

fn read_resource(path: &Path, name: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| OcrRateError::DictionaryLoad {
        name: name.to_string(),
        reason: format!("cannot read {}: {}", path.display(), e),
    })
}

fn read_hunspell_pair(dir: &Path, name: &str) -> Result<(String, String)> {
    let aff_path = dir.join(format!("{}.aff", name));
    let dic_path = dir.join(format!("{}.dic", name));
    let aff = read_resource(&aff_path, name)?;
    let dic = read_resource(&dic_path, name)?;
    Ok((aff, dic))
}

/// Build a single Hunspell dictionary using the zspell builder
fn build_dict(name: &str, aff: &str, dic: &str) -> Result<Dictionary> {
    let dict = zspell::builder()
        .config_str(aff)
        .dict_str(dic)
        .build()
        .map_err(|e| OcrRateError::DictionaryLoad {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    debug!(dictionary = %name, "built dictionary");
    Ok(dict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const AFF: &str = "SET UTF-8\n";
    const DIC: &str = "3\nكتاب\nقال\nhello\n";

    fn dict_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ar.aff"), AFF).unwrap();
        fs::write(dir.path().join("ar.dic"), DIC).unwrap();
        fs::write(dir.path().join("extra.txt"), "# names\nبغداد\n\n").unwrap();
        dir
    }

    fn config(dir: &Path) -> DictionaryConfig {
        DictionaryConfig {
            dir: dir.to_path_buf(),
            languages: vec!["ar".to_string()],
            wordlists: vec!["extra.txt".to_string()],
            case_fold: true,
            version: None,
        }
    }

    #[test]
    fn test_dictionary_loading() {
        let dir = dict_dir();
        let oracle = HunspellOracle::load(&config(dir.path())).unwrap();

        assert!(oracle.is_recognized("كتاب"));
        assert!(oracle.is_recognized("بغداد"));
        assert!(oracle.is_recognized("Hello"));

        assert!(!oracle.is_recognized("كتابXYZ"));
        assert!(!oracle.is_recognized("asdfgh"));
        assert_eq!(oracle.check_languages("بغداد"), vec!["wordlist"]);
    }

    #[test]
    fn test_version_is_stable_and_content_derived() {
        let dir = dict_dir();
        let a = HunspellOracle::load(&config(dir.path())).unwrap();
        let b = HunspellOracle::load(&config(dir.path())).unwrap();
        assert_eq!(a.version(), b.version());
        assert!(a.version().starts_with("ar+extra.txt@sha256:"));

        fs::write(dir.path().join("ar.dic"), "1\nكتاب\n").unwrap();
        let c = HunspellOracle::load(&config(dir.path())).unwrap();
        assert_ne!(a.version(), c.version());
    }

    #[test]
    fn test_explicit_version_wins() {
        let dir = dict_dir();
        let mut cfg = config(dir.path());
        cfg.version = Some("ayaspell-3.6".to_string());
        let oracle = HunspellOracle::load(&cfg).unwrap();
        assert_eq!(oracle.version(), "ayaspell-3.6");
    }

    #[test]
    fn test_missing_dictionary_is_fatal() {
        let dir = dict_dir();
        let mut cfg = config(dir.path());
        cfg.languages.push("fa".to_string());
        let err = HunspellOracle::load(&cfg).err().unwrap();
        assert!(err.is_fatal());
        assert!(matches!(err, OcrRateError::DictionaryLoad { ref name, .. } if name == "fa"));

        let cfg = DictionaryConfig {
            dir: PathBuf::from("/nonexistent/dictionaries"),
            ..DictionaryConfig::default()
        };
        assert!(HunspellOracle::load(&cfg).is_err());
    }

    #[test]
    fn test_wordlist_oracle() {
        let oracle = WordListOracle::new(["كتاب", "قال"], "test-1");
        assert!(oracle.is_recognized("قال"));
        assert!(!oracle.is_recognized("XYZ"));
        assert_eq!(oracle.version(), "test-1");
        assert_eq!(oracle.len(), 2);
    }
}
