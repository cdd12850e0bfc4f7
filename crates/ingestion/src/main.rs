//! Korpus Ingestion Service
//!
//! Loads a JSON Lines corpus file into the configured database:
//! 1. Opens (and if needed creates) the corpus schema
//! 2. Tokenizes and analyzes every passage
//! 3. Appends words after the last stored position
//!
//! Usage: `ingestion <corpus.jsonl>` or `KORPUS_INPUT=<corpus.jsonl> ingestion`

use anyhow::Context;
use korpus_common::{
    config::AppConfig,
    db::{DbPool, Repository},
    morph::DictionaryAnalyzer,
    VERSION,
};
use korpus_ingestion::CorpusLoader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting Korpus Ingestion Service v{}", VERSION);

    let input: PathBuf = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("KORPUS_INPUT").ok())
        .map(PathBuf::from)
        .context("No input file given; pass a path or set KORPUS_INPUT")?;

    // Initialize database connection
    let pool = DbPool::new(&config.database).await?;
    pool.migrate().await?;
    let repository = Repository::new(pool);

    let analyzer = DictionaryAnalyzer::from_config(&config.morphology)?;
    let loader = CorpusLoader::new(Arc::new(repository.clone()), Arc::new(analyzer));

    let summary = loader.load_file(&input).await?;
    let counts = repository.counts().await?;

    info!(
        passages = summary.passages,
        words = summary.words,
        skipped = summary.skipped,
        total_passages = counts.passages,
        total_words = counts.words,
        "Ingestion finished"
    );
    Ok(())
}
