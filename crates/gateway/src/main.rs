//! Korpus API Gateway
//!
//! HTTP entry point for corpus search.
//! Handles:
//! - Query evaluation (single and batch)
//! - Health and readiness probes
//! - Observability (logging, metrics)

mod handlers;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use korpus_common::{
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, Repository},
    metrics,
    morph::DictionaryAnalyzer,
};
use korpus_search::{QueryEngine, QueryParser, SequenceMatcher};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<QueryEngine>,
    /// Backing database; absent when serving an in-memory corpus
    pub repository: Option<Repository>,
    pub metrics: Option<PrometheusHandle>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load().context("Failed to load configuration")?);

    init_tracing(&config.observability);
    info!(
        service = %config.observability.service_name,
        "Starting Korpus API Gateway v{}",
        korpus_common::VERSION
    );

    // Initialize metrics
    let metrics_handle = if config.observability.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::LATENCY_BUCKETS,
            )?
            .set_buckets_for_metric(
                Matcher::Full(format!("{}_search_matches", metrics::METRICS_PREFIX)),
                metrics::MATCH_COUNT_BUCKETS,
            )?
            .install_recorder()?;
        metrics::register_metrics();
        Some(handle)
    } else {
        None
    };

    // Initialize database connection
    let pool = DbPool::new(&config.database).await?;
    pool.migrate().await?;
    let repository = Repository::new(pool);

    match repository.counts().await {
        Ok(counts) => info!(
            passages = counts.passages,
            words = counts.words,
            "Corpus opened"
        ),
        Err(e) => tracing::warn!(error = %e, "Could not count corpus records"),
    }

    // Build the query engine
    let analyzer = DictionaryAnalyzer::from_config(&config.morphology)?;
    let engine = QueryEngine::new(
        QueryParser::new(Arc::new(analyzer)),
        SequenceMatcher::new(config.search.span_scope),
        Arc::new(repository.clone()),
    );

    let state = AppState {
        config: config.clone(),
        engine: Arc::new(engine),
        repository: Some(repository),
        metrics: metrics_handle,
    };

    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Create the main application router
pub(crate) fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());
    let concurrency = ConcurrencyLimitLayer::new(state.config.server.max_concurrent_requests);

    Router::new()
        // Probes
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        // Search endpoints
        .route(
            "/search",
            get(handlers::search::search_get).post(handlers::search::search),
        )
        .route("/search/batch", post(handlers::search::batch_search))
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .layer(concurrency)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
