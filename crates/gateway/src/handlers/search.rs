//! Search handlers

use axum::{
    extract::{Query, State},
    Json,
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use korpus_common::{
    errors::{AppError, Result},
    metrics,
};
use korpus_search::{QueryOutcome, QueryReport};

/// Search request
///
/// Length is bounded by `search.max_query_length`, checked for every route.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Query string form of a search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Batch search request
#[derive(Debug, Deserialize, Validate)]
pub struct BatchSearchRequest {
    #[validate(length(min = 1))]
    pub queries: Vec<String>,
}

/// Batch search response
#[derive(Serialize)]
pub struct BatchSearchResponse {
    pub results: Vec<QueryReport>,
    pub processing_time_ms: u64,
}

/// Run one query from `GET /search?q=`
pub async fn search_get(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<QueryReport>> {
    run_single(&state, params.q).await.map(Json)
}

/// Run one query from a JSON body
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<QueryReport>> {
    run_single(&state, request.query).await.map(Json)
}

/// Batch search for multiple queries
///
/// Queries run concurrently; an invalid query is reported in place rather
/// than failing the batch.
pub async fn batch_search(
    State(state): State<AppState>,
    Json(request): Json<BatchSearchRequest>,
) -> Result<Json<BatchSearchResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("queries".to_string()),
    })?;

    let limit = state.config.search.max_batch_queries;
    if request.queries.len() > limit {
        return Err(AppError::PayloadTooLarge {
            size: request.queries.len(),
            limit,
        });
    }
    for query in &request.queries {
        check_length(&state, query)?;
    }

    let state = &state;
    let results = try_join_all(request.queries.into_iter().map(|query| async move {
        let outcome = evaluate(state, &query).await?;
        Ok::<_, AppError>(QueryReport::new(query, outcome))
    }))
    .await?;

    Ok(Json(BatchSearchResponse {
        results,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

async fn run_single(state: &AppState, query: String) -> Result<QueryReport> {
    check_length(state, &query)?;

    match evaluate(state, &query).await? {
        QueryOutcome::Invalid(err) => Err(AppError::InvalidQuery {
            query,
            reason: err.to_string(),
        }),
        outcome => Ok(QueryReport::new(query, outcome)),
    }
}

/// Evaluate a query and record its metrics
async fn evaluate(state: &AppState, query: &str) -> Result<QueryOutcome> {
    let start = Instant::now();

    let outcome = state.engine.run(query).await?;

    let elapsed = start.elapsed();
    let kind = outcome.kind().as_str();
    metrics::record_search(elapsed.as_secs_f64(), kind, outcome.match_count());

    tracing::info!(
        query = %query,
        outcome = kind,
        matches = outcome.match_count(),
        latency_ms = elapsed.as_millis() as u64,
        "Search completed"
    );

    Ok(outcome)
}

fn check_length(state: &AppState, query: &str) -> Result<()> {
    let limit = state.config.search.max_query_length;
    let length = query.chars().count();
    if length > limit {
        return Err(AppError::Validation {
            message: format!("Query is {} characters long, limit is {}", length, limit),
            field: Some("query".to_string()),
        });
    }
    Ok(())
}
