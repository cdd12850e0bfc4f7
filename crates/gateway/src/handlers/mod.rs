//! API handlers module

pub mod health;
pub mod search;

#[cfg(test)]
pub(crate) mod testing {
    //! Router harness over an in-memory corpus

    use crate::{create_router, AppState};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use korpus_common::{
        config::AppConfig,
        morph::{DictionaryAnalyzer, PartOfSpeech},
        store::{MemoryStore, Position, Record},
    };
    use korpus_search::{QueryEngine, QueryParser, SequenceMatcher};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    pub fn record(id: Position, token: &str, lemma: &str, pos: PartOfSpeech) -> Record {
        Record {
            id,
            token: token.to_string(),
            lemma: lemma.to_string(),
            pos: Some(pos),
            context_id: 1,
            context: "Кот бежит по двору.".to_string(),
            metadata: "@user, 2019".to_string(),
        }
    }

    pub fn test_state(records: Vec<Record>) -> AppState {
        test_state_with(AppConfig::default(), records)
    }

    pub fn test_state_with(config: AppConfig, records: Vec<Record>) -> AppState {
        let engine = QueryEngine::new(
            QueryParser::new(Arc::new(DictionaryAnalyzer::new())),
            SequenceMatcher::new(config.search.span_scope),
            Arc::new(MemoryStore::from_records(records)),
        );

        AppState {
            config: Arc::new(config),
            engine: Arc::new(engine),
            repository: None,
            metrics: None,
        }
    }

    pub async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        send(state, request).await
    }

    pub async fn post_json(state: AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(state, request).await
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}
