//! Database layer for Korpus
//!
//! Provides:
//! - SeaORM entity models for passages and words
//! - Repository implementing the record store over SQLite
//! - Connection pool management and schema setup

pub mod models;
mod repository;

pub use repository::{CorpusCounts, Repository};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Corpus schema; word positions double as primary keys
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS passages (
        id INTEGER PRIMARY KEY,
        context TEXT NOT NULL,
        metadata TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS words (
        id INTEGER PRIMARY KEY,
        token TEXT NOT NULL,
        lemma TEXT NOT NULL,
        pos TEXT,
        passage_id INTEGER NOT NULL REFERENCES passages(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_words_token ON words(token)",
    "CREATE INDEX IF NOT EXISTS idx_words_lemma ON words(lemma)",
    "CREATE INDEX IF NOT EXISTS idx_words_pos ON words(pos)",
];

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!(url = %config.url, "Connecting to database...");

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect to {}: {}", config.url, e),
            })?;

        info!("Database connection established");

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            self.conn.execute_unprepared(statement).await?;
        }
        info!("Corpus schema ready");
        Ok(())
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}
