//! Repository pattern for corpus storage
//!
//! Implements [`RecordStore`] and [`CorpusWriter`] over the SQLite schema.
//! Column predicates are resolved through the closed [`Column`] enum, so
//! only entity columns ever reach the query builder and values are always
//! bound parameters.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use crate::store::{
    check_append, Column, ContextId, CorpusWriter, Passage, Position, Predicate, Record,
    RecordStore, StoreResult, Word,
};
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;

/// Rows per multi-row insert, well below SQLite's bound-parameter limit
const INSERT_BATCH_SIZE: usize = 500;

/// Size of the stored corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorpusCounts {
    pub passages: u64,
    pub words: u64,
}

/// Repository for corpus data access
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.connection()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    /// Count stored passages and words
    pub async fn counts(&self) -> StoreResult<CorpusCounts> {
        let passages = PassageEntity::find().count(self.conn()).await?;
        let words = WordEntity::find().count(self.conn()).await?;
        Ok(CorpusCounts { passages, words })
    }
}

fn word_column(column: Column) -> WordColumn {
    match column {
        Column::Token => WordColumn::Token,
        Column::Lemma => WordColumn::Lemma,
        Column::Pos => WordColumn::Pos,
    }
}

// ============================================================================
// Lookups
// ============================================================================

#[async_trait]
impl RecordStore for Repository {
    async fn find_by_column(&self, predicate: &Predicate) -> StoreResult<Vec<Record>> {
        let rows = WordEntity::find()
            .filter(word_column(predicate.column).eq(predicate.value.as_str()))
            .find_also_related(PassageEntity)
            .order_by_asc(WordColumn::Id)
            .all(self.conn())
            .await?;

        let records = rows
            .into_iter()
            .filter_map(|(word, passage)| {
                let passage: Passage = passage?.into();
                Some(Record::new(word.into(), &passage))
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
        let mut query = WordEntity::find()
            .inner_join(PassageEntity)
            .filter(WordColumn::Id.eq(position))
            .filter(word_column(predicate.column).eq(predicate.value.as_str()));

        if let Some(context_id) = within {
            query = query.filter(WordColumn::PassageId.eq(context_id));
        }

        Ok(query.count(self.conn()).await? > 0)
    }
}

// ============================================================================
// Loading
// ============================================================================

#[async_trait]
impl CorpusWriter for Repository {
    async fn last_position(&self) -> StoreResult<Option<Position>> {
        let last = WordEntity::find()
            .order_by_desc(WordColumn::Id)
            .one(self.conn())
            .await?;
        Ok(last.map(|word| word.id))
    }

    async fn last_context_id(&self) -> StoreResult<Option<ContextId>> {
        let last = PassageEntity::find()
            .order_by_desc(PassageColumn::Id)
            .one(self.conn())
            .await?;
        Ok(last.map(|passage| passage.id))
    }

    async fn append(&self, passage: Passage, words: Vec<Word>) -> StoreResult<()> {
        check_append(self.last_position().await?, &passage, &words)?;

        let txn = self.conn().begin().await?;

        PassageEntity::insert(PassageActiveModel {
            id: Set(passage.id),
            context: Set(passage.context),
            metadata: Set(passage.metadata),
        })
        .exec_without_returning(&txn)
        .await?;

        let models: Vec<WordActiveModel> = words
            .into_iter()
            .map(|word| WordActiveModel {
                id: Set(word.id),
                token: Set(word.token),
                lemma: Set(word.lemma),
                pos: Set(word.pos.map(|pos| pos.label().to_string())),
                passage_id: Set(word.context_id),
            })
            .collect();

        for batch in models.chunks(INSERT_BATCH_SIZE) {
            WordEntity::insert_many(batch.to_vec())
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::morph::PartOfSpeech;
    use crate::store::StoreError;
    use sea_orm::ConnectionTrait;

    async fn repository() -> Repository {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..DatabaseConfig::default()
        };
        let pool = DbPool::new(&config).await.unwrap();
        pool.migrate().await.unwrap();
        Repository::new(pool)
    }

    fn word(id: Position, token: &str, pos: Option<PartOfSpeech>, context_id: ContextId) -> Word {
        Word {
            id,
            token: token.to_string(),
            lemma: token.to_string(),
            pos,
            context_id,
        }
    }

    fn passage(id: ContextId, context: &str) -> Passage {
        Passage {
            id,
            context: context.to_string(),
            metadata: format!("{{\"passage\": {}}}", id),
        }
    }

    async fn seeded() -> Repository {
        let repo = repository().await;
        repo.append(
            passage(1, "Кот бежит"),
            vec![
                word(5, "кот", Some(PartOfSpeech::Noun), 1),
                word(6, "бежит", Some(PartOfSpeech::Verb), 1),
            ],
        )
        .await
        .unwrap();
        repo.append(
            passage(2, "Пёс спит"),
            vec![
                word(7, "пёс", Some(PartOfSpeech::Noun), 2),
                word(8, "спит", None, 2),
            ],
        )
        .await
        .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_find_by_column_joins_passage() {
        let repo = seeded().await;

        let nouns = repo
            .find_by_column(&Predicate::pos(PartOfSpeech::Noun))
            .await
            .unwrap();

        let ids: Vec<_> = nouns.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 7]);
        assert_eq!(nouns[0].context, "Кот бежит");
        assert_eq!(nouns[1].metadata, "{\"passage\": 2}");
        assert_eq!(nouns[1].pos, Some(PartOfSpeech::Noun));
    }

    #[tokio::test]
    async fn test_find_by_column_is_exact() {
        let repo = seeded().await;

        let percent = repo.find_by_column(&Predicate::token("%")).await.unwrap();
        assert!(percent.is_empty());

        let cats = repo.find_by_column(&Predicate::token("кот")).await.unwrap();
        assert_eq!(cats.len(), 1);
    }

    #[tokio::test]
    async fn test_exists_at_point_lookup() {
        let repo = seeded().await;
        let verb = Predicate::pos(PartOfSpeech::Verb);

        assert!(repo.exists_at(6, &verb, None).await.unwrap());
        assert!(repo.exists_at(6, &verb, Some(1)).await.unwrap());
        assert!(!repo.exists_at(6, &verb, Some(2)).await.unwrap());
        assert!(!repo.exists_at(8, &verb, None).await.unwrap());
        assert!(!repo.exists_at(99, &verb, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_orphan_words_are_invisible_to_both_lookups() {
        let repo = seeded().await;
        repo.conn()
            .execute_unprepared("PRAGMA foreign_keys = OFF")
            .await
            .unwrap();
        repo.conn()
            .execute_unprepared(
                "INSERT INTO words (id, token, lemma, pos, passage_id) \
                 VALUES (9, 'лиса', 'лиса', 'noun', 42)",
            )
            .await
            .unwrap();

        let fox = Predicate::token("лиса");
        assert!(repo.find_by_column(&fox).await.unwrap().is_empty());
        assert!(!repo.exists_at(9, &fox, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_append_tracks_positions_and_counts() {
        let repo = seeded().await;

        assert_eq!(repo.last_position().await.unwrap(), Some(8));
        assert_eq!(repo.last_context_id().await.unwrap(), Some(2));
        assert_eq!(
            repo.counts().await.unwrap(),
            CorpusCounts {
                passages: 2,
                words: 4
            }
        );

        let err = repo
            .append(passage(3, "назад"), vec![word(4, "назад", None, 3)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Integrity { .. }));
    }

    #[tokio::test]
    async fn test_ping() {
        let repo = repository().await;
        tokio_test::assert_ok!(repo.ping().await);
    }
}
