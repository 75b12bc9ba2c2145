use crate::client::BedrockClientProvider;
use crate::node::{
    parse_config, CredentialRequirement, Node, NodeDefinition, PortDefinition, PACKAGE_VERSION,
};
use async_trait::async_trait;
use embeddings::{BedrockTitanClient, EmbeddingConfig, DEFAULT_EMBEDDING_MODEL};
use plugin_core::{template, CredentialSource, NodeError, NodeExecutionContext, NodeOutput};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

pub const BEDROCK_EMBEDDING: &str = "BedrockEmbedding";

pub const MAX_TEMPLATE_TEXT_CHARS: usize = 8192;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingNodeConfig {
    #[serde(default)]
    pub text_template: String,
    #[serde(flatten)]
    pub embedding: EmbeddingConfig,
}

impl EmbeddingNodeConfig {
    fn check_model(&self) -> Result<(), NodeError> {
        match self.embedding.model.as_deref() {
            Some(model) if !model.trim().is_empty() => Ok(()),
            _ => Err(NodeError::Validation("Model is required".to_string())),
        }
    }
}

fn check_text(text: &str) -> Result<(), NodeError> {
    if text.is_empty() {
        return Err(NodeError::Validation(
            "Text is required for embedding generation".to_string(),
        ));
    }
    if text.chars().count() > MAX_TEMPLATE_TEXT_CHARS {
        return Err(NodeError::Validation(format!(
            "Text exceeds maximum length of {} characters",
            MAX_TEMPLATE_TEXT_CHARS
        )));
    }
    Ok(())
}

/// Workflow node producing a single Titan embedding from a rendered text template.
pub struct BedrockEmbeddingNode {
    provider: Arc<BedrockClientProvider>,
}

impl BedrockEmbeddingNode {
    pub fn new(provider: Arc<BedrockClientProvider>) -> Self {
        Self { provider }
    }
}

pub(crate) fn embedding_config_schema() -> Value {
    json!({
        "model": {
            "type": "string",
            "title": "Model",
            "description": "Select the Bedrock embedding model to use",
            "enum": [DEFAULT_EMBEDDING_MODEL, "amazon.titan-embed-text-v1"],
            "enumNames": ["Titan Text Embeddings v2", "Titan Text Embeddings v1"],
            "default": DEFAULT_EMBEDDING_MODEL
        },
        "normalize": {
            "type": "boolean",
            "title": "Normalize Embeddings",
            "description": "Whether to normalize the embedding vectors (recommended for similarity search)",
            "default": true,
            "ui:widget": "toggle"
        },
        "dimensions": {
            "type": "number",
            "title": "Output Dimensions",
            "description": "Number of dimensions for the output embedding",
            "enum": [256, 512, 1024],
            "enumNames": ["256 dimensions", "512 dimensions", "1024 dimensions"],
            "default": 1024
        }
    })
}

#[async_trait]
impl Node for BedrockEmbeddingNode {
    fn node_type(&self) -> &str {
        BEDROCK_EMBEDDING
    }

    fn definition(&self) -> NodeDefinition {
        let mut properties = embedding_config_schema();
        properties["textTemplate"] = json!({
            "type": "string",
            "title": "Text Template",
            "description": "Optional template to transform input text before embedding. Use {{text}} to reference the input.",
            "default": "{{text}}",
            "ui:field": "template"
        });

        NodeDefinition {
            package_version: PACKAGE_VERSION.to_string(),
            node_type: BEDROCK_EMBEDDING.to_string(),
            name: "Bedrock Embedding".to_string(),
            description: "Generate vector embeddings from text using AWS Bedrock Titan models"
                .to_string(),
            category: "AI".to_string(),
            color: "#10a37f".to_string(),
            is_service: false,
            inputs: vec![PortDefinition {
                name: "text".to_string(),
                port_type: "string".to_string(),
                description: "Text to convert into embeddings".to_string(),
            }],
            outputs: vec![PortDefinition::object(
                "embedding",
                "The embedding vector array",
            )],
            service_connectors: vec![],
            config_schema: json!({
                "type": "object",
                "properties": properties,
                "required": ["model"]
            }),
            credentials: vec![CredentialRequirement::aws(
                "AWS credentials for accessing Bedrock",
            )],
        }
    }

    fn validate_config(&self, config: &Value) -> Result<(), NodeError> {
        let config: EmbeddingNodeConfig = parse_config(config)?;
        check_text(&config.text_template)?;
        config.check_model()
    }

    async fn execute(
        &self,
        inputs: Value,
        context: &NodeExecutionContext,
    ) -> Result<NodeOutput, NodeError> {
        let config: EmbeddingNodeConfig = parse_config(&context.config)?;
        let text = template::render(&config.text_template, &inputs);
        check_text(&text)?;
        config.check_model()?;

        info!(
            model = config.embedding.model(),
            text_length = text.len(),
            dimensions = ?config.embedding.dimensions,
            normalize = ?config.embedding.normalize,
            "Generating embedding using AWS Bedrock"
        );

        let source = CredentialSource::Context(context.credential_context(BEDROCK_EMBEDDING)?);
        let client = self.provider.client_for(&source).await?;
        let titan = BedrockTitanClient::new(client, config.embedding.clone());

        let result = titan.embed_one(&text).await.map_err(|e| {
            error!(node_id = %context.node_id, "Embedding generation failed: {}", e);
            match e {
                NodeError::Provider(message) => {
                    NodeError::Provider(format!("Failed to generate embedding: {}", message))
                }
                other => other,
            }
        })?;

        info!(
            dimensions = result.dimensions,
            expected_dimensions = ?config.embedding.dimensions,
            "Successfully generated embedding"
        );

        Ok(NodeOutput::new().with("embedding", json!(result)))
    }
}
