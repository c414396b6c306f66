//! HTTP surface tests against the in-process axum router.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::config::{Config, SearchConfig};
use crate::context::EmployeeContext;
use crate::corpus;
use crate::router::QueryRouter;
use crate::semantic::{DocumentIndex, Passage};
use crate::tests::{TableProvider, TEST_MODEL};
use crate::web::{api_router, SharedState};

fn passage(id: u64, text: &str, embedding: Vec<f32>) -> Passage {
    Passage {
        id,
        text: text.to_string(),
        metadata: BTreeMap::new(),
        embedding,
    }
}

fn test_index(texts: &[&str]) -> DocumentIndex {
    let passages = texts
        .iter()
        .enumerate()
        .map(|(i, t)| passage(i as u64, t, vec![1.0, 0.0]))
        .collect();
    DocumentIndex::from_parts(TEST_MODEL.to_string(), passages).unwrap()
}

fn test_state(corpus_path: &str) -> Arc<SharedState> {
    let mut ctx = EmployeeContext::default();
    ctx.employee.manager_name = "Jane Doe".to_string();

    let provider = Arc::new(TableProvider::new(&[(
        "What is the dress code?",
        vec![1.0, 0.0],
    )]));
    let router = QueryRouter::new(provider, SearchConfig::default());

    let mut config = Config::default();
    config.corpus_path = corpus_path.to_string();

    Arc::new(SharedState::new(
        router,
        ctx,
        test_index(&["Business attire is required on client days."]),
        config,
    ))
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn ask_returns_a_structured_decision() {
    let app = api_router(test_state("/nonexistent.json"));

    let (status, body) = post_json(
        app,
        "/api/ask",
        serde_json::json!({"question": "Who is my manager?"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "structured");
    assert_eq!(body["payload"], "Jane Doe");
}

#[tokio::test]
async fn ask_returns_a_document_decision() {
    let app = api_router(test_state("/nonexistent.json"));

    let (status, body) = post_json(
        app,
        "/api/ask",
        serde_json::json!({"question": "What is the dress code?"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "document");
    assert_eq!(
        body["payload"][0]["text"],
        "Business attire is required on client days."
    );
}

#[tokio::test]
async fn ask_never_surfaces_an_error() {
    // The provider has no vector for this question, so the semantic
    // path fails internally; the API must still answer 200 + failsafe.
    let app = api_router(test_state("/nonexistent.json"));

    let (status, body) = post_json(
        app,
        "/api/ask",
        serde_json::json!({"question": "completely unknown question"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "failsafe");
}

#[tokio::test]
async fn health_reports_index_size_and_model() {
    let app = api_router(test_state("/nonexistent.json"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["indexed"], 1);
    assert_eq!(body["model"], TEST_MODEL);
}

#[tokio::test]
async fn reindex_swaps_in_the_new_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.json");

    // Publish a two-passage corpus file, then ask the daemon to pick
    // it up in place of its one-passage index.
    let fresh = test_index(&["first passage", "second passage"]);
    corpus::save_prebuilt(&fresh, &path).unwrap();

    let state = test_state(path.to_str().unwrap());
    let app = api_router(state);

    let (status, body) = post_json(app.clone(), "/api/reindex", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["indexed"], 2);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let health: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["indexed"], 2);
}

#[tokio::test]
async fn reindex_with_a_missing_file_reports_an_error() {
    let app = api_router(test_state("/nonexistent/knowledge.json"));

    let (status, body) = post_json(app, "/api/reindex", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}
