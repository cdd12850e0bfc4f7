//! Korpus Search
//!
//! Query language and phrase evaluation over a tagged corpus:
//! - [`query`]: classify raw query terms into tags, literals and lemmas
//! - [`matcher`]: positional phrase matching against a record store
//! - [`engine`]: parse → match orchestration and the caller-facing report

pub mod engine;
pub mod matcher;
pub mod query;

pub use engine::{ContextMatch, OutcomeKind, QueryEngine, QueryOutcome, QueryReport};
pub use matcher::{MatchSpan, SequenceMatcher};
pub use query::{MatchTerm, ParseError, QueryParser};
