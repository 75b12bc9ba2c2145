use crate::document::{document_to_json, json_to_document};
use crate::image::{fetch_image, FetchedImage};
use crate::models::{
    ClaudeConfig, ClaudeResponse, ResponseBlock, ToolChoiceMode, ToolSchema, ToolUse, Usage,
};
use aws_sdk_bedrockruntime::{
    error::ProvideErrorMetadata,
    primitives::Blob,
    types::{
        AnyToolChoice, AutoToolChoice, ContentBlock, ConversationRole,
        ConverseOutput as ConverseOutputType, ImageBlock, ImageSource, InferenceConfiguration,
        Message, SystemContentBlock, TokenUsage, Tool, ToolChoice, ToolConfiguration,
        ToolInputSchema, ToolSpecification,
    },
    Client,
};
use log::{error, info};
use plugin_core::NodeError;

/// Runs single-turn Claude conversations through the Bedrock Converse API.
#[derive(Debug, Clone, Default)]
pub struct ClaudeService {
    http: reqwest::Client,
}

impl ClaudeService {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub async fn converse(
        &self,
        client: &Client,
        config: &ClaudeConfig,
    ) -> Result<ClaudeResponse, NodeError> {
        config.validate()?;

        let image = match config.image_url() {
            Some(url) => Some(fetch_image(&self.http, url).await?),
            None => None,
        };
        let message = build_user_message(&config.prompt, image)?;

        let tool_config = match config.tools()? {
            Some(tools) => {
                info!(
                    "Tool configuration enabled: {} tool(s), first '{}', choice {:?}",
                    tools.len(),
                    tools[0].name,
                    config.tool_choice
                );
                Some(build_tool_config(&tools, config.tool_choice)?)
            }
            None => {
                info!(
                    "Tools not enabled or no schema (enable_tools = {})",
                    config.enable_tools
                );
                None
            }
        };

        info!(
            "Calling Bedrock Claude model {} (temperature {}, max tokens {}, tools {})",
            config.model,
            config.temperature,
            config.max_tokens,
            tool_config.is_some()
        );

        let response = client
            .converse()
            .model_id(&config.model)
            .messages(message)
            .set_system(
                config
                    .system_prompt()
                    .map(|prompt| vec![SystemContentBlock::Text(prompt.to_string())]),
            )
            .inference_config(
                InferenceConfiguration::builder()
                    .max_tokens(config.max_tokens as i32)
                    .temperature(config.temperature)
                    .build(),
            )
            .set_tool_config(tool_config)
            .send()
            .await
            .map_err(|e| {
                error!("Bedrock Claude API call failed: {:?}", e);
                let code = e.as_service_error().and_then(|se| se.code());
                let message = e
                    .as_service_error()
                    .and_then(|se| se.message())
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string());
                NodeError::from_provider_code(code, message)
            })?;

        let output = response
            .output()
            .ok_or_else(|| NodeError::Provider("No output received from Bedrock".to_string()))?;

        let result =
            ClaudeResponse::from_blocks(response_blocks(output), response.usage().map(usage_from));

        info!(
            "Bedrock Claude API call successful: {} chars, tool use: {}",
            result.text.len(),
            result.tool_use.is_some()
        );

        Ok(result)
    }
}

fn build_user_message(prompt: &str, image: Option<FetchedImage>) -> Result<Message, NodeError> {
    let mut builder = Message::builder().role(ConversationRole::User);

    if let Some(image) = image {
        let block = ImageBlock::builder()
            .format(image.kind.to_sdk())
            .source(ImageSource::Bytes(Blob::new(image.bytes)))
            .build()
            .map_err(|e| NodeError::ImageFetch(format!("Failed to build image block: {}", e)))?;
        builder = builder.content(ContentBlock::Image(block));
    }

    builder
        .content(ContentBlock::Text(prompt.to_string()))
        .build()
        .map_err(|e| NodeError::Validation(format!("Failed to build Bedrock message: {}", e)))
}

fn build_tool_config(
    tools: &[ToolSchema],
    choice: ToolChoiceMode,
) -> Result<ToolConfiguration, NodeError> {
    let specs = tools
        .iter()
        .map(|tool| {
            ToolSpecification::builder()
                .name(&tool.name)
                .set_description(Some(tool.description.clone()).filter(|d| !d.is_empty()))
                .input_schema(ToolInputSchema::Json(json_to_document(&tool.input_schema.json)))
                .build()
                .map(Tool::ToolSpec)
                .map_err(|e| NodeError::ToolSchema(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let tool_choice = match choice {
        ToolChoiceMode::Required => ToolChoice::Any(AnyToolChoice::builder().build()),
        ToolChoiceMode::Auto => ToolChoice::Auto(AutoToolChoice::builder().build()),
    };

    ToolConfiguration::builder()
        .set_tools(Some(specs))
        .tool_choice(tool_choice)
        .build()
        .map_err(|e| NodeError::ToolSchema(e.to_string()))
}

fn response_blocks(output: &ConverseOutputType) -> Vec<ResponseBlock> {
    let ConverseOutputType::Message(message) = output else {
        return vec![];
    };

    message
        .content()
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text(text) => Some(ResponseBlock::Text(text.clone())),
            ContentBlock::ToolUse(tool) => Some(ResponseBlock::ToolUse(ToolUse {
                tool_name: tool.name().to_string(),
                tool_input: document_to_json(tool.input()),
            })),
            _ => None,
        })
        .collect()
}

fn usage_from(usage: &TokenUsage) -> Usage {
    Usage {
        input_tokens: usage.input_tokens().max(0) as u32,
        output_tokens: usage.output_tokens().max(0) as u32,
        total_tokens: usage.total_tokens().max(0) as u32,
    }
}
