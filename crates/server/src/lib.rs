pub mod errors;
pub mod models;

use axum::{
    extract::{Json as ExtractJson, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use errors::ApiError;
use log::{debug, info};
use models::{ExecuteRequest, HealthResponse, ServiceCallRequest};
use nodes::{BedrockClientProvider, NodeDefinition, NodeRegistry};
use plugin_core::{BundleCredentialResolver, ClientCache, NodeOutput};
use plugin_core::config::Config;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<NodeRegistry>,
    pub provider: Arc<BedrockClientProvider>,
}

impl AppState {
    /// Wires the Bedrock nodes to a fresh client cache and the bundle credential resolver.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = Arc::new(
            BedrockClientProvider::new(
                Arc::new(ClientCache::new()),
                Arc::new(BundleCredentialResolver),
            )
            .with_default_region(&config.bedrock.default_region),
        );
        let registry = Arc::new(NodeRegistry::with_bedrock_nodes(provider.clone())?);
        Ok(Self { registry, provider })
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        nodes: state.registry.node_count(),
        cached_clients: state.provider.cache().len(),
    })
}

async fn list_nodes(State(state): State<AppState>) -> Json<Vec<NodeDefinition>> {
    Json(state.registry.definitions())
}

async fn execute_node(
    State(state): State<AppState>,
    Path(node_type): Path<String>,
    ExtractJson(request): ExtractJson<ExecuteRequest>,
) -> Result<Json<NodeOutput>, ApiError> {
    debug!("POST /nodes/{}/execute (node {})", node_type, request.context.node_id);
    let output = state
        .registry
        .execute_node(&node_type, request.inputs, request.context)
        .await?;
    Ok(Json(output))
}

async fn call_service(
    State(state): State<AppState>,
    Path(node_type): Path<String>,
    ExtractJson(request): ExtractJson<ServiceCallRequest>,
) -> Result<Json<Value>, ApiError> {
    debug!(
        "POST /nodes/{}/service method={} (node {})",
        node_type, request.method, request.context.node_id
    );
    let result = state
        .registry
        .call_service(&node_type, &request.method, request.params, request.context)
        .await?;
    Ok(Json(result))
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/nodes", get(list_nodes))
        .route("/nodes/:node_type/execute", post(execute_node))
        .route("/nodes/:node_type/service", post(call_service))
        .with_state(state)
}

/// Sweeps expired clients out of `cache` on a fixed interval.
pub fn spawn_cache_sweeper<H>(cache: Arc<ClientCache<H>>, every: Duration) -> JoinHandle<()>
where
    H: Clone + Send + 'static,
{
    info!("Client cache sweeper running every {:?}", every);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cache.sweep();
        }
    })
}
