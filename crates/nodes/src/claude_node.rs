use crate::client::BedrockClientProvider;
use crate::node::{
    parse_config, CredentialRequirement, Node, NodeDefinition, PortDefinition, PACKAGE_VERSION,
};
use async_trait::async_trait;
use llm::models::{CLAUDE_MODELS, DEFAULT_CLAUDE_MODEL, MAX_TOKENS_LIMIT};
use llm::{ClaudeConfig, ClaudeService};
use plugin_core::{template, CredentialSource, NodeError, NodeExecutionContext, NodeOutput};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub const BEDROCK_CLAUDE: &str = "BedrockClaude";

/// Text generation with Claude models on Bedrock, with optional image input and tool use.
pub struct BedrockClaudeNode {
    provider: Arc<BedrockClientProvider>,
    service: ClaudeService,
}

impl BedrockClaudeNode {
    pub fn new(provider: Arc<BedrockClientProvider>) -> Self {
        Self {
            provider,
            service: ClaudeService::new(),
        }
    }
}

/// Renders the template-capable fields of a Claude config against the node inputs.
pub fn resolve_templates(config: &mut ClaudeConfig, inputs: &Value) {
    config.prompt = template::render(&config.prompt, inputs);
    if let Some(system_prompt) = config.system_prompt.as_mut() {
        *system_prompt = template::render(system_prompt, inputs);
    }
    if let Some(image_url) = config.image_url.as_mut() {
        *image_url = template::render(image_url, inputs);
    }
    if let Some(Value::String(schema)) = config.tool_schema.as_mut() {
        *schema = template::render(schema, inputs);
    }
}

#[async_trait]
impl Node for BedrockClaudeNode {
    fn node_type(&self) -> &str {
        BEDROCK_CLAUDE
    }

    fn definition(&self) -> NodeDefinition {
        let (model_ids, model_names): (Vec<&str>, Vec<&str>) = CLAUDE_MODELS.iter().copied().unzip();

        NodeDefinition {
            package_version: PACKAGE_VERSION.to_string(),
            node_type: BEDROCK_CLAUDE.to_string(),
            name: "Bedrock Claude".to_string(),
            description: "AWS Bedrock Claude models with optional tool support".to_string(),
            category: "AI".to_string(),
            color: "#10a37f".to_string(),
            is_service: false,
            inputs: vec![PortDefinition::object("signal", "Input to prompt")],
            outputs: vec![
                PortDefinition::object("output", "Response object"),
                PortDefinition::object("usage", "Token burn"),
                PortDefinition::object("toolUse", "Selected Tool"),
            ],
            service_connectors: vec![],
            config_schema: json!({
                "type": "object",
                "properties": {
                    "model": {
                        "type": "string",
                        "title": "Model",
                        "description": "Select the Claude model to use",
                        "enum": model_ids,
                        "enumNames": model_names,
                        "default": DEFAULT_CLAUDE_MODEL
                    },
                    "maxTokens": {
                        "type": "number",
                        "title": "Max Tokens",
                        "description": "Maximum number of tokens to generate",
                        "default": 256,
                        "minimum": 1,
                        "maximum": MAX_TOKENS_LIMIT
                    },
                    "temperature": {
                        "type": "number",
                        "title": "Temperature",
                        "description": "Controls randomness (0-1)",
                        "default": 0.7,
                        "minimum": 0,
                        "maximum": 1,
                        "step": 0.1
                    },
                    "systemPrompt": {
                        "type": "string",
                        "title": "System Prompt",
                        "description": "System message prompt. Supports template syntax like {{input.fieldName}} to reference input data.",
                        "default": "",
                        "ui:field": "template"
                    },
                    "prompt": {
                        "type": "string",
                        "title": "Prompt",
                        "description": "User message/prompt. Supports template syntax like {{input.fieldName}} to reference input data.",
                        "default": "",
                        "ui:field": "template"
                    },
                    "includeImageUrl": {
                        "type": "boolean",
                        "title": "Include Image URL",
                        "description": "Enable image analysis by providing an image URL",
                        "default": false,
                        "ui:widget": "toggle"
                    },
                    "imageUrl": {
                        "type": "string",
                        "title": "Image URL",
                        "description": "URL of the image to analyze. Supports template syntax like {{input.imageUrl}}",
                        "default": "",
                        "ui:field": "template",
                        "ui:dependencies": {"includeImageUrl": true}
                    },
                    "enableTools": {
                        "type": "boolean",
                        "title": "Enable Tools",
                        "description": "Enable tool usage for structured outputs",
                        "default": false,
                        "ui:widget": "toggle"
                    },
                    "toolChoice": {
                        "type": "string",
                        "title": "Tool Choice",
                        "description": "How Claude should use tools",
                        "enum": ["required", "auto"],
                        "enumNames": ["Required - Must use tools", "Auto - Optional tool use"],
                        "default": "required",
                        "ui:dependencies": {"enableTools": true}
                    },
                    "toolSchema": {
                        "type": "object",
                        "title": "Tool Schema",
                        "description": "JSON schema for the tool function",
                        "default": "{}",
                        "ui:field": "template",
                        "ui:dependencies": {"enableTools": true}
                    }
                },
                "required": ["model"]
            }),
            credentials: vec![CredentialRequirement::aws(
                "AWS credentials for Bedrock API access (accessKeyId, secretAccessKey, region)",
            )],
        }
    }

    fn validate_config(&self, config: &Value) -> Result<(), NodeError> {
        parse_config::<ClaudeConfig>(config)?.validate()
    }

    async fn execute(
        &self,
        inputs: Value,
        context: &NodeExecutionContext,
    ) -> Result<NodeOutput, NodeError> {
        let started = Instant::now();
        info!(node_id = %context.node_id, "Starting BedrockClaude execution");

        let mut config: ClaudeConfig = parse_config(&context.config)?;
        resolve_templates(&mut config, &inputs);
        config.validate()?;
        config.tools()?;

        let source = CredentialSource::Context(context.credential_context(BEDROCK_CLAUDE)?);
        let client = self.provider.client_for(&source).await?;
        let response = self.service.converse(&client, &config).await?;

        info!(
            node_id = %context.node_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "BedrockClaude execution finished"
        );

        Ok(NodeOutput::new()
            .with("output", response.primary_output())
            .with("usage", json!(response.usage))
            .with("toolUse", json!(response.tool_use)))
    }
}
