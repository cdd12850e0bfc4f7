//! In-memory record store
//!
//! Words are kept sorted by position so point lookups are a binary search.
//! Suitable for tests and small corpora loaded at startup.

use super::{
    check_append, ContextId, CorpusWriter, Passage, Position, Predicate, Record, RecordStore,
    StoreResult, Word,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Corpus {
    words: Vec<Word>,
    passages: BTreeMap<ContextId, Passage>,
}

impl Corpus {
    fn word_at(&self, position: Position) -> Option<&Word> {
        self.words
            .binary_search_by_key(&position, |word| word.id)
            .ok()
            .map(|index| &self.words[index])
    }
}

/// Record store backed by a sorted vector
#[derive(Debug, Default)]
pub struct MemoryStore {
    corpus: RwLock<Corpus>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from joined records.
    ///
    /// Records are sorted by position; when a position occurs twice the
    /// first record given wins.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut corpus = Corpus::default();

        for record in records {
            let (word, passage) = record.into_parts();
            corpus.passages.entry(passage.id).or_insert(passage);
            corpus.words.push(word);
        }

        corpus.words.sort_by_key(|word| word.id);
        corpus.words.dedup_by_key(|word| word.id);

        Self {
            corpus: RwLock::new(corpus),
        }
    }

    /// Number of stored words
    pub async fn len(&self) -> usize {
        self.corpus.read().await.words.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.corpus.read().await.words.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_column(&self, predicate: &Predicate) -> StoreResult<Vec<Record>> {
        let corpus = self.corpus.read().await;

        let records = corpus
            .words
            .iter()
            .filter(|word| predicate.matches(word))
            .filter_map(|word| {
                // Words without a passage are invisible, like an inner join
                corpus
                    .passages
                    .get(&word.context_id)
                    .map(|passage| Record::new(word.clone(), passage))
            })
            .collect();

        Ok(records)
    }

    async fn exists_at(
        &self,
        position: Position,
        predicate: &Predicate,
        within: Option<ContextId>,
    ) -> StoreResult<bool> {
        let corpus = self.corpus.read().await;

        let found = corpus.word_at(position).is_some_and(|word| {
            predicate.matches(word)
                && within.map_or(true, |context_id| word.context_id == context_id)
                && corpus.passages.contains_key(&word.context_id)
        });

        Ok(found)
    }
}

#[async_trait]
impl CorpusWriter for MemoryStore {
    async fn last_position(&self) -> StoreResult<Option<Position>> {
        Ok(self.corpus.read().await.words.last().map(|word| word.id))
    }

    async fn last_context_id(&self) -> StoreResult<Option<ContextId>> {
        Ok(self
            .corpus
            .read()
            .await
            .passages
            .last_key_value()
            .map(|(id, _)| *id))
    }

    async fn append(&self, passage: Passage, words: Vec<Word>) -> StoreResult<()> {
        let mut corpus = self.corpus.write().await;

        check_append(corpus.words.last().map(|word| word.id), &passage, &words)?;

        corpus.passages.insert(passage.id, passage);
        corpus.words.extend(words);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::PartOfSpeech;
    use crate::store::StoreError;

    fn record(id: Position, token: &str, pos: PartOfSpeech, context_id: ContextId) -> Record {
        Record {
            id,
            token: token.to_string(),
            lemma: token.to_string(),
            pos: Some(pos),
            context_id,
            context: format!("passage {}", context_id),
            metadata: format!("meta {}", context_id),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::from_records(vec![
            record(6, "бежит", PartOfSpeech::Verb, 1),
            record(5, "кот", PartOfSpeech::Noun, 1),
            record(7, "пёс", PartOfSpeech::Noun, 2),
        ])
    }

    #[tokio::test]
    async fn test_find_by_column_in_position_order() {
        let store = store();

        let nouns = store
            .find_by_column(&Predicate::pos(PartOfSpeech::Noun))
            .await
            .unwrap();

        let ids: Vec<_> = nouns.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 7]);
        assert_eq!(nouns[1].context, "passage 2");
    }

    #[tokio::test]
    async fn test_exists_at_checks_position_and_passage() {
        let store = store();
        let noun = Predicate::pos(PartOfSpeech::Noun);

        assert!(store.exists_at(7, &noun, None).await.unwrap());
        assert!(!store.exists_at(6, &noun, None).await.unwrap());
        assert!(!store.exists_at(42, &noun, None).await.unwrap());
        assert!(!store.exists_at(7, &noun, Some(1)).await.unwrap());
        assert!(store.exists_at(7, &noun, Some(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_orphan_words_are_invisible_to_both_lookups() {
        let store = store();
        store.corpus.write().await.words.push(Word {
            id: 8,
            token: "лиса".into(),
            lemma: "лиса".into(),
            pos: Some(PartOfSpeech::Noun),
            context_id: 9,
        });

        let foxes = store.find_by_column(&Predicate::token("лиса")).await.unwrap();
        assert!(foxes.is_empty());
        assert!(!store
            .exists_at(8, &Predicate::token("лиса"), None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_append_continues_positions() {
        let store = store();
        assert_eq!(store.last_position().await.unwrap(), Some(7));
        assert_eq!(store.last_context_id().await.unwrap(), Some(2));

        let passage = Passage {
            id: 3,
            context: "лиса".into(),
            metadata: "{}".into(),
        };
        let fox = Word {
            id: 8,
            token: "лиса".into(),
            lemma: "лиса".into(),
            pos: Some(PartOfSpeech::Noun),
            context_id: 3,
        };
        store.append(passage.clone(), vec![fox.clone()]).await.unwrap();
        assert_eq!(store.len().await, 4);

        let err = store.append(passage, vec![fox]).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity { .. }));
    }
}
