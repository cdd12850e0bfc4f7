//! Query Parser - classifies raw query terms
//!
//! A query is a whitespace-separated list of terms. Each term is, in order of
//! precedence, a part-of-speech label (`noun`, `verb`, ...), a quoted word
//! form (`"кота"` or `'кота'`), or a bare alphanumeric word reduced to its
//! lemma. Anything else invalidates the whole query.

use korpus_common::morph::{MorphAnalyzer, PartOfSpeech};
use korpus_common::store::{Column, Predicate};
use regex_lite::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Bare words: Cyrillic or ASCII letters and digits only (already lower-cased)
static BARE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[а-яёa-z0-9]+$").expect("bare token pattern is valid"));

/// One classified query term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MatchTerm {
    /// Part-of-speech label
    PosTag(PartOfSpeech),
    /// Exact word form, quotes stripped
    Literal(String),
    /// Dictionary normal form of a bare word
    Lemma(String),
}

impl MatchTerm {
    /// Word column this term is evaluated against
    pub fn column(&self) -> Column {
        match self {
            MatchTerm::PosTag(_) => Column::Pos,
            MatchTerm::Literal(_) => Column::Token,
            MatchTerm::Lemma(_) => Column::Lemma,
        }
    }

    /// Store predicate equivalent to this term
    pub fn predicate(&self) -> Predicate {
        match self {
            MatchTerm::PosTag(pos) => Predicate::pos(*pos),
            MatchTerm::Literal(text) => Predicate::token(text.as_str()),
            MatchTerm::Lemma(lemma) => Predicate::lemma(lemma.as_str()),
        }
    }
}

impl fmt::Display for MatchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTerm::PosTag(pos) => write!(f, "{}", pos),
            MatchTerm::Literal(text) => write!(f, "\"{}\"", text),
            MatchTerm::Lemma(lemma) => write!(f, "{}", lemma),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized term `{term}` at position {index}")]
    UnrecognizedTerm { term: String, index: usize },
}

/// Query parser turning raw strings into match terms
#[derive(Clone)]
pub struct QueryParser {
    analyzer: Arc<dyn MorphAnalyzer>,
}

impl QueryParser {
    /// Create a parser that lemmatizes bare words with `analyzer`
    pub fn new(analyzer: Arc<dyn MorphAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Parse a raw query.
    ///
    /// Empty or all-whitespace input yields no terms. The first unrecognized
    /// term aborts parsing; no partial term list is returned.
    pub fn parse(&self, raw: &str) -> Result<Vec<MatchTerm>, ParseError> {
        raw.split_whitespace()
            .enumerate()
            .map(|(index, term)| {
                self.classify(term).ok_or_else(|| ParseError::UnrecognizedTerm {
                    term: term.to_string(),
                    index,
                })
            })
            .collect()
    }

    fn classify(&self, term: &str) -> Option<MatchTerm> {
        let term = term.to_lowercase();

        if let Some(pos) = PartOfSpeech::from_label(&term) {
            return Some(MatchTerm::PosTag(pos));
        }

        if let Some(inner) = strip_quotes(&term) {
            return Some(MatchTerm::Literal(inner.to_string()));
        }

        if BARE_TOKEN.is_match(&term) {
            return Some(MatchTerm::Lemma(self.analyzer.lemma_of(&term)));
        }

        None
    }
}

/// Inner text of a term wrapped in one matching pair of `"` or `'`
fn strip_quotes(term: &str) -> Option<&str> {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| term.strip_prefix(quote)?.strip_suffix(quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use korpus_common::morph::{Analysis, DictionaryAnalyzer};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn parser() -> QueryParser {
        let mut dictionary = DictionaryAnalyzer::new();
        dictionary.insert("кошки", "кошка", Some(PartOfSpeech::Noun));
        dictionary.insert("бежит", "бежать", Some(PartOfSpeech::Verb));
        QueryParser::new(Arc::new(dictionary))
    }

    /// Analyzer that counts how often it is consulted
    #[derive(Default)]
    struct CountingAnalyzer {
        calls: AtomicUsize,
    }

    impl MorphAnalyzer for CountingAnalyzer {
        fn analyze(&self, word: &str) -> Analysis {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Analysis {
                lemma: word.to_string(),
                pos: None,
            }
        }
    }

    #[test]
    fn test_classification_precedence() {
        let terms = parser().parse("NOUN \"бежит\" 'кот' кошки 'noun'").unwrap();

        assert_eq!(
            terms,
            vec![
                MatchTerm::PosTag(PartOfSpeech::Noun),
                MatchTerm::Literal("бежит".into()),
                MatchTerm::Literal("кот".into()),
                MatchTerm::Lemma("кошка".into()),
                MatchTerm::Literal("noun".into()),
            ]
        );
    }

    #[test]
    fn test_every_label_is_a_tag() {
        let parser = parser();
        for pos in PartOfSpeech::ALL {
            assert_eq!(parser.parse(pos.label()).unwrap(), vec![MatchTerm::PosTag(pos)]);
        }
    }

    #[test]
    fn test_empty_query_has_no_terms() {
        assert!(parser().parse("").unwrap().is_empty());
        assert!(parser().parse(" \t\n ").unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_term_rejects_query() {
        let err = parser().parse("noun xyz123!").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnrecognizedTerm {
                term: "xyz123!".into(),
                index: 1
            }
        );

        for raw in ["\"", "'кот\"", "кот-пёс", "über", "a_b", "\"open"] {
            assert!(parser().parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_quotes_are_structural_only() {
        let terms = parser().parse("\"\" '\"кот\"'").unwrap();
        assert_eq!(
            terms,
            vec![
                MatchTerm::Literal(String::new()),
                MatchTerm::Literal("\"кот\"".into()),
            ]
        );
    }

    #[test]
    fn test_bare_words_are_lowercased_and_lemmatized() {
        let terms = parser().parse("КОШКИ Ёж abc123").unwrap();
        assert_eq!(
            terms,
            vec![
                MatchTerm::Lemma("кошка".into()),
                MatchTerm::Lemma("ёж".into()),
                MatchTerm::Lemma("abc123".into()),
            ]
        );
    }

    #[test]
    fn test_analyzer_only_sees_bare_words() {
        let analyzer = Arc::new(CountingAnalyzer::default());
        let parser = QueryParser::new(analyzer.clone());

        parser.parse("noun \"кот\" 'пёс' verb").unwrap();
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);

        parser.parse("кот бежит").unwrap();
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_term_predicates() {
        assert_eq!(
            MatchTerm::PosTag(PartOfSpeech::Adj).predicate(),
            Predicate::pos(PartOfSpeech::Adj)
        );
        assert_eq!(MatchTerm::Literal("кот".into()).column(), Column::Token);
        assert_eq!(MatchTerm::Lemma("кот".into()).column(), Column::Lemma);
        assert_eq!(MatchTerm::Literal("кот".into()).to_string(), "\"кот\"");
    }
}
