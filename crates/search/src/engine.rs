//! Query engine: parse, match, report
//!
//! Each call to [`QueryEngine::run`] is independent; the engine holds no
//! per-query state and can be shared across tasks.

use crate::matcher::{MatchSpan, SequenceMatcher};
use crate::query::{ParseError, QueryParser};
use korpus_common::errors::INVALID_QUERY_MESSAGE;
use korpus_common::store::{RecordStore, StoreResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Result of evaluating one raw query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// A term could not be classified; nothing was matched
    Invalid(ParseError),
    /// The query had no terms
    Empty,
    /// Evaluation ran; may hold zero spans
    Matched(Vec<MatchSpan>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Invalid,
    Empty,
    Matched,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Invalid => "invalid",
            OutcomeKind::Empty => "empty",
            OutcomeKind::Matched => "matched",
        }
    }
}

impl QueryOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            QueryOutcome::Invalid(_) => OutcomeKind::Invalid,
            QueryOutcome::Empty => OutcomeKind::Empty,
            QueryOutcome::Matched(_) => OutcomeKind::Matched,
        }
    }

    pub fn match_count(&self) -> usize {
        self.spans().len()
    }

    pub fn spans(&self) -> &[MatchSpan] {
        match self {
            QueryOutcome::Matched(spans) => spans,
            QueryOutcome::Invalid(_) | QueryOutcome::Empty => &[],
        }
    }
}

/// Orchestrates parser and matcher over one record store
#[derive(Clone)]
pub struct QueryEngine {
    parser: QueryParser,
    matcher: SequenceMatcher,
    store: Arc<dyn RecordStore>,
}

impl QueryEngine {
    pub fn new(parser: QueryParser, matcher: SequenceMatcher, store: Arc<dyn RecordStore>) -> Self {
        Self {
            parser,
            matcher,
            store,
        }
    }

    /// Evaluate a raw query.
    ///
    /// Parse failures are an [`QueryOutcome::Invalid`] outcome, not an error;
    /// only fatal store failures are returned as `Err`.
    pub async fn run(&self, raw: &str) -> StoreResult<QueryOutcome> {
        let terms = match self.parser.parse(raw) {
            Ok(terms) => terms,
            Err(err) => {
                debug!(query = raw, error = %err, "Query rejected");
                return Ok(QueryOutcome::Invalid(err));
            }
        };

        if terms.is_empty() {
            return Ok(QueryOutcome::Empty);
        }

        debug!(query = raw, terms = terms.len(), "Query parsed");

        let spans = self.matcher.match_all(&terms, self.store.as_ref()).await?;
        Ok(QueryOutcome::Matched(spans))
    }
}

/// One reported match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextMatch {
    pub context: String,
    pub metadata: String,
}

/// Caller-facing shape of an outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryReport {
    /// The query exactly as received
    pub query: String,

    pub outcome: OutcomeKind,

    pub match_count: usize,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<ContextMatch>,

    /// User-facing hint for invalid queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QueryReport {
    pub fn new(query: impl Into<String>, outcome: QueryOutcome) -> Self {
        let kind = outcome.kind();
        let (matches, message) = match outcome {
            QueryOutcome::Matched(spans) => (
                spans
                    .into_iter()
                    .map(|span| ContextMatch {
                        context: span.context,
                        metadata: span.metadata,
                    })
                    .collect(),
                None,
            ),
            QueryOutcome::Empty => (Vec::new(), None),
            QueryOutcome::Invalid(_) => (Vec::new(), Some(INVALID_QUERY_MESSAGE.to_string())),
        };

        Self {
            query: query.into(),
            outcome: kind,
            match_count: matches.len(),
            matches,
            message,
        }
    }
}
