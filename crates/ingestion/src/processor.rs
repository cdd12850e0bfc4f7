//! Corpus loader
//!
//! Turns passages into positioned, analyzed words and appends them to a
//! [`CorpusWriter`]. Positions continue from whatever the corpus already
//! holds, so loading the same store twice appends rather than overwrites.

use crate::errors::IngestionError;
use crate::tokenizer::tokenize;
use korpus_common::metrics;
use korpus_common::morph::MorphAnalyzer;
use korpus_common::store::{ContextId, CorpusWriter, Passage, Position, Word};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument, warn};

/// One input passage (a line of JSON Lines input)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageInput {
    pub text: String,

    /// Free-form description; strings are stored as-is, other values as JSON
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl PassageInput {
    pub fn metadata_string(&self) -> String {
        match &self.metadata {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Totals for one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub passages: usize,
    pub words: usize,
    /// Passages without a single kept word
    pub skipped: usize,
}

/// Next ids to hand out
#[derive(Debug, Clone, Copy)]
struct Cursor {
    position: Position,
    context_id: ContextId,
}

/// Loads passages into a corpus
pub struct CorpusLoader {
    writer: Arc<dyn CorpusWriter>,
    analyzer: Arc<dyn MorphAnalyzer>,
}

impl CorpusLoader {
    pub fn new(writer: Arc<dyn CorpusWriter>, analyzer: Arc<dyn MorphAnalyzer>) -> Self {
        Self { writer, analyzer }
    }

    /// Tokenize and analyze a passage into words numbered from `first_position`
    pub fn analyze_passage(
        &self,
        text: &str,
        context_id: ContextId,
        first_position: Position,
    ) -> Vec<Word> {
        tokenize(text)
            .into_iter()
            .map(|token| {
                let form = token.text.to_lowercase();
                let analysis = self.analyzer.analyze(&form);
                Word {
                    id: first_position + token.index as Position,
                    token: form,
                    lemma: analysis.lemma,
                    pos: analysis.pos,
                    context_id,
                }
            })
            .collect()
    }

    /// Load passages in order
    pub async fn load_passages(
        &self,
        inputs: impl IntoIterator<Item = PassageInput>,
    ) -> Result<LoadSummary, IngestionError> {
        let start = Instant::now();
        let mut cursor = self.cursor().await?;
        let mut summary = LoadSummary::default();

        for input in inputs {
            self.load_one(&mut cursor, input, &mut summary).await?;
        }

        self.finish(start, summary);
        Ok(summary)
    }

    /// Load JSON Lines from a reader; blank lines are ignored
    pub async fn load_jsonl<R>(&self, reader: R) -> Result<LoadSummary, IngestionError>
    where
        R: AsyncBufRead + Unpin,
    {
        let start = Instant::now();
        let mut cursor = self.cursor().await?;
        let mut summary = LoadSummary::default();

        let mut lines = reader.lines();
        let mut line_number = 0;
        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            let input: PassageInput =
                serde_json::from_str(&line).map_err(|e| IngestionError::MalformedLine {
                    line: line_number,
                    message: e.to_string(),
                })?;

            self.load_one(&mut cursor, input, &mut summary).await?;
        }

        self.finish(start, summary);
        Ok(summary)
    }

    /// Load a JSON Lines file
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn load_file(&self, path: &Path) -> Result<LoadSummary, IngestionError> {
        if !path.exists() {
            return Err(IngestionError::FileNotFound(path.display().to_string()));
        }

        info!("Loading corpus file");
        let file = tokio::fs::File::open(path).await?;
        self.load_jsonl(BufReader::new(file)).await
    }

    async fn cursor(&self) -> Result<Cursor, IngestionError> {
        let position = self.writer.last_position().await?.map_or(1, |last| last + 1);
        let context_id = self.writer.last_context_id().await?.map_or(1, |last| last + 1);
        Ok(Cursor {
            position,
            context_id,
        })
    }

    async fn load_one(
        &self,
        cursor: &mut Cursor,
        input: PassageInput,
        summary: &mut LoadSummary,
    ) -> Result<(), IngestionError> {
        let words = self.analyze_passage(&input.text, cursor.context_id, cursor.position);
        if words.is_empty() {
            warn!(context_id = cursor.context_id, "Passage has no words, skipping");
            summary.skipped += 1;
            return Ok(());
        }

        let word_count = words.len();
        let passage = Passage {
            id: cursor.context_id,
            metadata: input.metadata_string(),
            context: input.text,
        };

        debug!(
            context_id = passage.id,
            first_position = cursor.position,
            words = word_count,
            "Appending passage"
        );
        self.writer.append(passage, words).await?;

        cursor.position += word_count as Position;
        cursor.context_id += 1;
        summary.passages += 1;
        summary.words += word_count;
        Ok(())
    }

    fn finish(&self, start: Instant, summary: LoadSummary) {
        let elapsed = start.elapsed();
        metrics::record_ingestion(elapsed.as_secs_f64(), summary.passages, summary.words);

        info!(
            passages = summary.passages,
            words = summary.words,
            skipped = summary.skipped,
            latency_ms = elapsed.as_millis() as u64,
            "Corpus load complete"
        );
    }
}
