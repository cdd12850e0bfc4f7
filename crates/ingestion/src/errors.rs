//! Ingestion error types

use korpus_common::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Malformed passage on line {line}: {message}")]
    MalformedLine { line: usize, message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
