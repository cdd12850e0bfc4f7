//! Positional sequence matcher
//!
//! Evaluates an ordered list of match terms as a phrase: the first term is
//! looked up by column, every record found is a candidate start, and each
//! following term must hold at the next consecutive position. Spans are
//! reported in the order the first lookup returned their start, without
//! re-sorting or deduplication.
//!
//! A span reports the context and metadata of its first word only; later
//! words are checked for existence and their passages are not read.

use crate::query::MatchTerm;
use korpus_common::store::{
    ContextId, Position, Predicate, Record, RecordStore, SpanScope, StoreResult,
};
use serde::Serialize;
use tracing::{debug, warn};

/// A matching run of positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    /// Position of the first word
    pub start: Position,

    /// Passage of the first word
    pub context_id: ContextId,

    pub context: String,

    pub metadata: String,
}

impl From<Record> for MatchSpan {
    fn from(record: Record) -> Self {
        Self {
            start: record.id,
            context_id: record.context_id,
            context: record.context,
            metadata: record.metadata,
        }
    }
}

/// Phrase evaluator over a [`RecordStore`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceMatcher {
    scope: SpanScope,
}

impl SequenceMatcher {
    pub fn new(scope: SpanScope) -> Self {
        Self { scope }
    }

    /// Find every contiguous run matching `terms` in order.
    ///
    /// Recoverable lookup failures drop the affected candidates (or, for the
    /// first lookup, yield no spans); fatal store errors are returned.
    pub async fn match_all(
        &self,
        terms: &[MatchTerm],
        store: &dyn RecordStore,
    ) -> StoreResult<Vec<MatchSpan>> {
        let Some((first, rest)) = terms.split_first() else {
            return Ok(Vec::new());
        };

        let candidates = match store.find_by_column(&first.predicate()).await {
            Ok(records) => records,
            Err(err) if !err.is_fatal() => {
                warn!(term = %first, error = %err, "Unigram lookup failed, treating as no match");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        debug!(
            term = %first,
            candidates = candidates.len(),
            phrase_len = terms.len(),
            "Unigram lookup complete"
        );

        if rest.is_empty() {
            return Ok(candidates.into_iter().map(MatchSpan::from).collect());
        }

        let predicates: Vec<Predicate> = rest.iter().map(MatchTerm::predicate).collect();
        let mut spans = Vec::new();

        for start in candidates {
            if self.continues(&start, &predicates, store).await? {
                spans.push(MatchSpan::from(start));
            }
        }

        debug!(spans = spans.len(), "Phrase evaluation complete");
        Ok(spans)
    }

    /// Whether `predicates` hold at the positions right after `start`
    async fn continues(
        &self,
        start: &Record,
        predicates: &[Predicate],
        store: &dyn RecordStore,
    ) -> StoreResult<bool> {
        let within = match self.scope {
            SpanScope::Corpus => None,
            SpanScope::Passage => Some(start.context_id),
        };

        for (offset, predicate) in (1..).zip(predicates) {
            let Some(position) = start.id.checked_add(offset) else {
                return Ok(false);
            };

            match store.exists_at(position, predicate, within).await {
                Ok(true) => {}
                Ok(false) => return Ok(false),
                Err(err) if !err.is_fatal() => {
                    warn!(
                        position,
                        predicate = %predicate,
                        error = %err,
                        "Offset lookup failed, dropping candidate"
                    );
                    return Ok(false);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(true)
    }
}
