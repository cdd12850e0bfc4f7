//! Korpus Ingestion
//!
//! Builds the positional index: passages are tokenized, each word is
//! lower-cased and analyzed, and the words are appended to the corpus with
//! consecutive positions.

pub mod errors;
pub mod processor;
pub mod tokenizer;

pub use errors::IngestionError;
pub use processor::{CorpusLoader, LoadSummary, PassageInput};
pub use tokenizer::{tokenize, WordToken};
