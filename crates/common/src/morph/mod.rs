//! Morphological analysis
//!
//! Reduces a word form to its dictionary lemma and part-of-speech tag.
//! The analyzer is a capability trait so the query parser and the corpus
//! loader can run against any backend; the bundled [`DictionaryAnalyzer`]
//! reads a tab-separated form/lemma/tag dictionary.

use crate::config::MorphologyConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Closed set of part-of-speech labels understood by the query language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Adj,
    Verb,
    Infn,
    Prtf,
    Prts,
    Grnd,
    Numr,
    Advb,
    Npro,
    Pred,
    Prep,
    Conj,
    Prcl,
    Intj,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 15] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Adj,
        PartOfSpeech::Verb,
        PartOfSpeech::Infn,
        PartOfSpeech::Prtf,
        PartOfSpeech::Prts,
        PartOfSpeech::Grnd,
        PartOfSpeech::Numr,
        PartOfSpeech::Advb,
        PartOfSpeech::Npro,
        PartOfSpeech::Pred,
        PartOfSpeech::Prep,
        PartOfSpeech::Conj,
        PartOfSpeech::Prcl,
        PartOfSpeech::Intj,
    ];

    /// Lower-case label as written in queries and stored in the corpus
    pub fn label(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Adj => "adj",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Infn => "infn",
            PartOfSpeech::Prtf => "prtf",
            PartOfSpeech::Prts => "prts",
            PartOfSpeech::Grnd => "grnd",
            PartOfSpeech::Numr => "numr",
            PartOfSpeech::Advb => "advb",
            PartOfSpeech::Npro => "npro",
            PartOfSpeech::Pred => "pred",
            PartOfSpeech::Prep => "prep",
            PartOfSpeech::Conj => "conj",
            PartOfSpeech::Prcl => "prcl",
            PartOfSpeech::Intj => "intj",
        }
    }

    /// Exact, case-sensitive label lookup
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|pos| pos.label() == label)
    }

    /// Map an OpenCorpora grammeme (`NOUN`, `ADJF`, `INFN`, ...) to a label.
    ///
    /// Full and short adjectives (`ADJF`, `ADJS`) and the comparative (`COMP`)
    /// collapse into [`PartOfSpeech::Adj`].
    pub fn from_opencorpora(tag: &str) -> Option<Self> {
        let pos = match tag.trim().to_ascii_uppercase().as_str() {
            "NOUN" => PartOfSpeech::Noun,
            "ADJF" | "ADJS" | "COMP" => PartOfSpeech::Adj,
            "VERB" => PartOfSpeech::Verb,
            "INFN" => PartOfSpeech::Infn,
            "PRTF" => PartOfSpeech::Prtf,
            "PRTS" => PartOfSpeech::Prts,
            "GRND" => PartOfSpeech::Grnd,
            "NUMR" => PartOfSpeech::Numr,
            "ADVB" => PartOfSpeech::Advb,
            "NPRO" => PartOfSpeech::Npro,
            "PRED" => PartOfSpeech::Pred,
            "PREP" => PartOfSpeech::Prep,
            "CONJ" => PartOfSpeech::Conj,
            "PRCL" => PartOfSpeech::Prcl,
            "INTJ" => PartOfSpeech::Intj,
            other => return Self::from_label(&other.to_lowercase()),
        };
        Some(pos)
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Primary parse of a word form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Dictionary normal form
    pub lemma: String,

    /// Part of speech, if the analyzer knows the word
    pub pos: Option<PartOfSpeech>,
}

/// Morphological analyzer capability
pub trait MorphAnalyzer: Send + Sync {
    /// Analyze a single word form; never fails, unknown words fall back to
    /// their own lower-cased form
    fn analyze(&self, word: &str) -> Analysis;

    /// Normal form of the primary parse
    fn lemma_of(&self, word: &str) -> String {
        self.analyze(word).lemma
    }
}

#[derive(Error, Debug)]
pub enum MorphError {
    #[error("Failed to read dictionary {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dictionary line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Dictionary-backed analyzer
///
/// Line format: `form<TAB>lemma[<TAB>TAG]`. Blank lines and lines starting
/// with `#` are ignored. When a form appears more than once the first entry
/// is kept as its primary parse.
#[derive(Debug, Clone, Default)]
pub struct DictionaryAnalyzer {
    entries: HashMap<String, Analysis>,
}

impl DictionaryAnalyzer {
    /// Create an analyzer with no entries (every word is its own lemma)
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dictionary file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MorphError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| MorphError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let analyzer = Self::from_tsv(&contents)?;
        tracing::info!(
            path = %path.display(),
            entries = analyzer.len(),
            "Morphology dictionary loaded"
        );
        Ok(analyzer)
    }

    /// Analyzer for the configured dictionary, or an empty one if none is set
    pub fn from_config(config: &MorphologyConfig) -> Result<Self, MorphError> {
        match &config.dictionary_path {
            Some(path) => Self::load(path),
            None => {
                tracing::warn!("No morphology dictionary configured, words are their own lemmas");
                Ok(Self::new())
            }
        }
    }

    /// Parse dictionary contents
    pub fn from_tsv(contents: &str) -> Result<Self, MorphError> {
        let mut analyzer = Self::new();

        for (index, line) in contents.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t');
            let form = fields.next().map(str::trim).unwrap_or_default();
            let lemma = fields.next().map(str::trim).unwrap_or_default();
            if form.is_empty() || lemma.is_empty() {
                return Err(MorphError::Malformed {
                    line: index + 1,
                    message: "expected `form<TAB>lemma[<TAB>TAG]`".to_string(),
                });
            }
            let pos = fields.next().and_then(PartOfSpeech::from_opencorpora);

            analyzer.insert(form, lemma, pos);
        }

        Ok(analyzer)
    }

    /// Add an entry; returns `false` if the form already had a primary parse
    pub fn insert(&mut self, form: &str, lemma: &str, pos: Option<PartOfSpeech>) -> bool {
        let key = form.to_lowercase();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            Analysis {
                lemma: lemma.to_lowercase(),
                pos,
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MorphAnalyzer for DictionaryAnalyzer {
    fn analyze(&self, word: &str) -> Analysis {
        let key = word.to_lowercase();
        match self.entries.get(&key) {
            Some(analysis) => analysis.clone(),
            None => Analysis {
                lemma: key,
                pos: None,
            },
        }
    }
}
