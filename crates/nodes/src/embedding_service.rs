use crate::client::BedrockClientProvider;
use crate::embedding_node::embedding_config_schema;
use crate::node::{
    parse_config, CredentialRequirement, Node, NodeDefinition, ServiceConnector, PACKAGE_VERSION,
};
use async_trait::async_trait;
use embeddings::{
    validate_embedding_text, validate_model_config, BedrockTitanClient, EmbeddingConfig,
};
use plugin_core::{CredentialSource, NodeError, NodeExecutionContext, NodeOutput};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

pub const BEDROCK_EMBEDDING_SERVICE: &str = "BedrockEmbeddingService";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMethod {
    CreateEmbedding,
    CreateBatchEmbeddings,
}

impl ServiceMethod {
    pub const ALL: [ServiceMethod; 2] = [
        ServiceMethod::CreateEmbedding,
        ServiceMethod::CreateBatchEmbeddings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ServiceMethod::CreateEmbedding => "createEmbedding",
            ServiceMethod::CreateBatchEmbeddings => "createBatchEmbeddings",
        }
    }

    fn names() -> Vec<String> {
        Self::ALL.iter().map(|m| m.name().to_string()).collect()
    }
}

impl fmt::Display for ServiceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServiceMethod {
    type Err = NodeError;

    fn from_str(method: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == method)
            .ok_or_else(|| NodeError::UnsupportedMethod {
                method: method.to_string(),
                available: Self::names(),
            })
    }
}

/// Host configs sometimes arrive wrapped as `{"config": {...}}`.
fn unwrap_config(config: &Value) -> &Value {
    match config.get("config") {
        Some(inner) if inner.is_object() => inner,
        _ => config,
    }
}

fn single_text(params: &Value) -> Result<String, NodeError> {
    let text = match params.get("text") {
        None | Some(Value::Null) => "",
        Some(Value::String(text)) => text.trim(),
        Some(_) => {
            return Err(NodeError::Validation("text must be a string".to_string()));
        }
    };
    validate_embedding_text(text)?;
    Ok(text.to_string())
}

fn batch_texts(params: &Value) -> Result<Vec<String>, NodeError> {
    let texts = params
        .get("texts")
        .and_then(Value::as_array)
        .ok_or_else(|| NodeError::Validation("texts must be an array".to_string()))?;
    if texts.is_empty() {
        return Err(NodeError::Validation(
            "texts array cannot be empty".to_string(),
        ));
    }

    texts
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let text = value.as_str().map(str::trim).unwrap_or_default();
            validate_embedding_text(text).map_err(|e| {
                let reason = match e {
                    NodeError::Validation(reason) => reason,
                    other => other.to_string(),
                };
                NodeError::Validation(format!("Text at index {}: {}", i, reason))
            })?;
            Ok(text.to_string())
        })
        .collect()
}

/// Service-only node answering embedding requests from other nodes.
pub struct BedrockEmbeddingServiceNode {
    provider: Arc<BedrockClientProvider>,
}

impl BedrockEmbeddingServiceNode {
    pub fn new(provider: Arc<BedrockClientProvider>) -> Self {
        Self { provider }
    }

    async fn titan_client(
        &self,
        config: EmbeddingConfig,
        context: &NodeExecutionContext,
    ) -> Result<BedrockTitanClient, NodeError> {
        let source =
            CredentialSource::Context(context.credential_context(BEDROCK_EMBEDDING_SERVICE)?);
        let client = self.provider.client_for(&source).await?;
        Ok(BedrockTitanClient::new(client, config))
    }

    async fn dispatch(
        &self,
        method: ServiceMethod,
        params: &Value,
        config: EmbeddingConfig,
        context: &NodeExecutionContext,
    ) -> Result<Value, NodeError> {
        match method {
            ServiceMethod::CreateEmbedding => {
                let text = single_text(params)?;
                validate_model_config(&config)?;
                info!(
                    text_length = text.len(),
                    model = config.model(),
                    dimensions = ?config.dimensions,
                    "createEmbedding called"
                );

                let result = self.titan_client(config, context).await?.embed_one(&text).await?;
                Ok(json!(result))
            }
            ServiceMethod::CreateBatchEmbeddings => {
                let texts = batch_texts(params)?;
                validate_model_config(&config)?;
                info!(
                    count = texts.len(),
                    model = config.model(),
                    "Creating batch embeddings"
                );

                let result = self.titan_client(config, context).await?.embed(&texts).await?;
                info!("Successfully generated {} embeddings", result.count);
                Ok(json!(result))
            }
        }
    }
}

#[async_trait]
impl Node for BedrockEmbeddingServiceNode {
    fn node_type(&self) -> &str {
        BEDROCK_EMBEDDING_SERVICE
    }

    fn definition(&self) -> NodeDefinition {
        NodeDefinition {
            package_version: PACKAGE_VERSION.to_string(),
            node_type: BEDROCK_EMBEDDING_SERVICE.to_string(),
            name: "Embedding Service".to_string(),
            description: "AWS Bedrock embedding service provider - responds to SERVICE_CALL signals"
                .to_string(),
            category: "AI".to_string(),
            color: "#10a37f".to_string(),
            is_service: true,
            inputs: vec![],
            outputs: vec![],
            service_connectors: vec![ServiceConnector {
                name: "embeddingService".to_string(),
                description: "Provides embedding generation services".to_string(),
                service_type: "embedding".to_string(),
                methods: ServiceMethod::names(),
            }],
            config_schema: json!({
                "type": "object",
                "properties": embedding_config_schema(),
                "required": ["model"]
            }),
            credentials: vec![CredentialRequirement::aws(
                "AWS credentials for accessing Bedrock API",
            )],
        }
    }

    async fn execute(
        &self,
        _inputs: Value,
        _context: &NodeExecutionContext,
    ) -> Result<NodeOutput, NodeError> {
        Err(NodeError::ServiceOnly(BEDROCK_EMBEDDING_SERVICE.to_string()))
    }

    async fn handle_service_call(
        &self,
        method: &str,
        params: Value,
        context: &NodeExecutionContext,
    ) -> Result<Value, NodeError> {
        let method: ServiceMethod = method.parse()?;
        info!(method = %method, node_id = %context.node_id, "Handling SERVICE_CALL");

        let config: EmbeddingConfig = parse_config(unwrap_config(&context.config))?;
        match self.dispatch(method, &params, config, context).await {
            Ok(result) => {
                info!(method = %method, node_id = %context.node_id, "SERVICE_CALL completed");
                Ok(result)
            }
            Err(e) => {
                error!(method = %method, node_id = %context.node_id, "SERVICE_CALL failed: {}", e);
                Err(e)
            }
        }
    }
}
