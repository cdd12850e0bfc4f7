//! Korpus Common Library
//!
//! Shared code for the Korpus services including:
//! - Configuration management
//! - Error types and handling
//! - Morphological analysis (lemmas and part-of-speech tags)
//! - The record store abstraction and its in-memory implementation
//! - SQLite-backed record store (SeaORM)
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod morph;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};
pub use morph::{Analysis, DictionaryAnalyzer, MorphAnalyzer, PartOfSpeech};
pub use store::{
    Column, ContextId, CorpusWriter, MemoryStore, Passage, Position, Predicate, Record,
    RecordStore, SpanScope, StoreError, Word,
};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
