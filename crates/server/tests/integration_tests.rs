use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use plugin_core::config::Config;
use plugin_core::{CacheKey, ClientCache, ManualClock};
use serde_json::{json, Value};
use server::{create_app, spawn_cache_sweeper, AppState};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app() -> Router {
    create_app(AppState::from_config(&Config::default()).unwrap())
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn context(config: Value) -> Value {
    json!({
        "workflowId": "wf-1",
        "executionId": "exec-1",
        "nodeId": "node-1",
        "config": config
    })
}

#[tokio::test]
async fn should_report_health_with_registered_nodes() {
    let (status, json) = send(app(), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["nodes"], 3);
    assert_eq!(json["cached_clients"], 0);
}

#[tokio::test]
async fn should_list_node_definitions() {
    let (status, json) = send(app(), "GET", "/nodes", None).await;

    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["type"].as_str().unwrap())
        .collect();
    assert_eq!(
        types,
        vec!["BedrockClaude", "BedrockEmbedding", "BedrockEmbeddingService"]
    );
    assert_eq!(json[2]["isService"], true);
}

#[tokio::test]
async fn should_return_404_for_unknown_node_type() {
    let body = json!({"context": context(json!({})), "inputs": {}});
    let (status, json) = send(app(), "POST", "/nodes/OpenAI/execute", Some(body)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "unknown_node");
}

#[tokio::test]
async fn should_return_400_for_unsupported_service_method() {
    let body = json!({
        "context": context(json!({"model": "amazon.titan-embed-text-v2:0"})),
        "method": "summarize",
        "params": {}
    });
    let (status, json) = send(
        app(),
        "POST",
        "/nodes/BedrockEmbeddingService/service",
        Some(body),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "unsupported_method");
    assert_eq!(
        json["error"],
        "Unknown service method: summarize. Available methods: createEmbedding, createBatchEmbeddings"
    );
}

#[tokio::test]
async fn should_return_409_when_executing_service_node() {
    let body = json!({"context": context(json!({})), "inputs": {}});
    let (status, json) = send(
        app(),
        "POST",
        "/nodes/BedrockEmbeddingService/execute",
        Some(body),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "service_only");
}

#[tokio::test]
async fn should_return_409_for_service_call_on_regular_node() {
    let body = json!({"context": context(json!({})), "method": "createEmbedding"});
    let (status, json) = send(app(), "POST", "/nodes/BedrockClaude/service", Some(body)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "not_a_service");
}

#[tokio::test]
async fn should_return_401_when_credentials_are_missing() {
    let body = json!({
        "context": context(json!({"textTemplate": "{{text}}", "model": "amazon.titan-embed-text-v2:0"})),
        "inputs": {"text": "hello"}
    });
    let (status, json) = send(app(), "POST", "/nodes/BedrockEmbedding/execute", Some(body)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "credentials_not_found");
}

#[tokio::test]
async fn should_return_400_for_invalid_claude_config() {
    let body = json!({
        "context": context(json!({"prompt": "hi", "temperature": 3.0})),
        "inputs": {}
    });
    let (status, json) = send(app(), "POST", "/nodes/BedrockClaude/execute", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
}

#[tokio::test]
async fn should_sweep_expired_clients_in_background() {
    let clock = Arc::new(ManualClock::new());
    let cache: Arc<ClientCache<String>> =
        Arc::new(ClientCache::with_clock(Duration::from_secs(300), clock.clone()));
    cache
        .get_or_create(&CacheKey::new("node-1", "BedrockClaude", "exec-1"), || async {
            Ok::<_, ()>("client".to_string())
        })
        .await
        .unwrap();

    clock.advance(Duration::from_secs(301));
    let sweeper = spawn_cache_sweeper(cache.clone(), Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(100)).await;
    sweeper.abort();

    assert!(cache.is_empty());
}
