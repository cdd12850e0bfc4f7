//! Record store abstraction
//!
//! A corpus is an ordered run of word records keyed by a strictly increasing
//! position id: consecutive ids are consecutive words of the source text.
//! Readers look records up by column value ([`RecordStore::find_by_column`])
//! or check a single position ([`RecordStore::exists_at`]); the corpus loader
//! appends through [`CorpusWriter`].

mod memory;

pub use memory::MemoryStore;

use crate::morph::PartOfSpeech;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Word position in the corpus
pub type Position = i64;

/// Identifier of the passage a word belongs to
pub type ContextId = i64;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot be reached at all; aborts the whole evaluation
    #[error("Record store unavailable: {message}")]
    Unavailable { message: String },

    /// A single lookup failed; the caller may treat it as "no match"
    #[error("Record lookup failed: {message}")]
    Lookup { message: String },

    #[error("Record write failed: {message}")]
    Write { message: String },

    /// Appended data would break position ordering
    #[error("Corpus integrity violation: {message}")]
    Integrity { message: String },
}

impl StoreError {
    /// Fatal errors must propagate; everything else is scoped to one lookup
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
                StoreError::Unavailable {
                    message: err.to_string(),
                }
            }
            sea_orm::DbErr::Exec(_) | sea_orm::DbErr::RecordNotInserted => StoreError::Write {
                message: err.to_string(),
            },
            _ => StoreError::Lookup {
                message: err.to_string(),
            },
        }
    }
}

/// Searchable word column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Token,
    Lemma,
    Pos,
}

impl Column {
    /// Storage column name
    pub fn name(&self) -> &'static str {
        match self {
            Column::Token => "token",
            Column::Lemma => "lemma",
            Column::Pos => "pos",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Equality predicate on one column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub column: Column,
    pub value: String,
}

impl Predicate {
    pub fn token(value: impl Into<String>) -> Self {
        Self {
            column: Column::Token,
            value: value.into(),
        }
    }

    pub fn lemma(value: impl Into<String>) -> Self {
        Self {
            column: Column::Lemma,
            value: value.into(),
        }
    }

    pub fn pos(pos: PartOfSpeech) -> Self {
        Self {
            column: Column::Pos,
            value: pos.label().to_string(),
        }
    }

    /// Exact comparison against a word; untagged words never match a tag
    pub fn matches(&self, word: &Word) -> bool {
        match self.column {
            Column::Token => word.token == self.value,
            Column::Lemma => word.lemma == self.value,
            Column::Pos => word.pos.is_some_and(|pos| pos.label() == self.value),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:?}", self.column, self.value)
    }
}

/// Enclosing passage of a run of words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: ContextId,

    /// Human-readable surrounding text
    pub context: String,

    /// Opaque descriptive payload
    pub metadata: String,
}

/// One indexed word occurrence, without its passage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: Position,
    pub token: String,
    pub lemma: String,
    pub pos: Option<PartOfSpeech>,
    pub context_id: ContextId,
}

/// A word joined with its passage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: Position,
    pub token: String,
    pub lemma: String,
    pub pos: Option<PartOfSpeech>,
    pub context_id: ContextId,
    pub context: String,
    pub metadata: String,
}

impl Record {
    pub fn new(word: Word, passage: &Passage) -> Self {
        Self {
            id: word.id,
            token: word.token,
            lemma: word.lemma,
            pos: word.pos,
            context_id: word.context_id,
            context: passage.context.clone(),
            metadata: passage.metadata.clone(),
        }
    }

    /// Split back into its word and passage halves
    pub fn into_parts(self) -> (Word, Passage) {
        let passage = Passage {
            id: self.context_id,
            context: self.context,
            metadata: self.metadata,
        };
        let word = Word {
            id: self.id,
            token: self.token,
            lemma: self.lemma,
            pos: self.pos,
            context_id: self.context_id,
        };
        (word, passage)
    }
}

/// Whether a phrase match may run across passage boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanScope {
    /// Any run of consecutive positions, even across passages
    #[default]
    Corpus,
    /// Every word of the run must share the first word's passage
    Passage,
}

/// Read access to the positional index
///
/// Words whose passage is missing are invisible to both lookups.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records whose column equals the predicate value, in position order
    async fn find_by_column(&self, predicate: &Predicate) -> StoreResult<Vec<Record>>;

    /// Whether the record at `position` satisfies the predicate, optionally
    /// restricted to one passage
    async fn exists_at(
        &self,
        position: Position,
        predicate: &Predicate,
        within: Option<ContextId>,
    ) -> StoreResult<bool>;
}

/// Append access used by the corpus loader
#[async_trait]
pub trait CorpusWriter: Send + Sync {
    /// Highest word position stored so far
    async fn last_position(&self) -> StoreResult<Option<Position>>;

    /// Highest passage id stored so far
    async fn last_context_id(&self) -> StoreResult<Option<ContextId>>;

    /// Store one passage and its words; word ids must continue the corpus
    async fn append(&self, passage: Passage, words: Vec<Word>) -> StoreResult<()>;
}

/// Check that `words` belong to `passage` and extend the corpus after `last`
pub(crate) fn check_append(
    last: Option<Position>,
    passage: &Passage,
    words: &[Word],
) -> StoreResult<()> {
    let mut previous = last;
    for word in words {
        if word.context_id != passage.id {
            return Err(StoreError::Integrity {
                message: format!(
                    "word {} points at passage {}, expected {}",
                    word.id, word.context_id, passage.id
                ),
            });
        }
        if previous.is_some_and(|prev| word.id <= prev) {
            return Err(StoreError::Integrity {
                message: format!("word position {} does not follow {:?}", word.id, previous),
            });
        }
        previous = Some(word.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(id: Position, token: &str, pos: Option<PartOfSpeech>) -> Word {
        Word {
            id,
            token: token.to_string(),
            lemma: token.to_string(),
            pos,
            context_id: 1,
        }
    }

    #[test]
    fn test_predicate_matches_column() {
        let cat = word(1, "кот", Some(PartOfSpeech::Noun));

        assert!(Predicate::token("кот").matches(&cat));
        assert!(Predicate::lemma("кот").matches(&cat));
        assert!(Predicate::pos(PartOfSpeech::Noun).matches(&cat));
        assert!(!Predicate::pos(PartOfSpeech::Verb).matches(&cat));
        assert!(!Predicate::token("кота").matches(&cat));
    }

    #[test]
    fn test_untagged_word_never_matches_pos() {
        let unknown = word(1, "ъ", None);
        assert!(!Predicate::pos(PartOfSpeech::Noun).matches(&unknown));
    }

    #[test]
    fn test_only_unavailable_is_fatal() {
        assert!(StoreError::Unavailable { message: "down".into() }.is_fatal());
        assert!(!StoreError::Lookup { message: "bad row".into() }.is_fatal());
    }

    #[test]
    fn test_check_append_rejects_out_of_order_positions() {
        let passage = Passage {
            id: 1,
            context: "кот бежит".into(),
            metadata: String::new(),
        };
        let words = vec![word(5, "кот", None), word(6, "бежит", None)];

        assert!(check_append(Some(4), &passage, &words).is_ok());
        assert!(check_append(Some(5), &passage, &words).is_err());
        assert!(check_append(None, &passage, &[word(2, "a", None), word(2, "b", None)]).is_err());
    }

    #[test]
    fn test_span_scope_deserializes_lowercase() {
        let scope: SpanScope = serde_json::from_str("\"passage\"").unwrap();
        assert_eq!(scope, SpanScope::Passage);
        assert_eq!(SpanScope::default(), SpanScope::Corpus);
    }
}
